//! Memoryless clamped linear block.

use sl_core::numeric::ensure_finite;
use sl_core::{ByteReader, ByteWriter, CoreError, frame};

use crate::block::{SisoBlock, eq_concrete};
use crate::error::{BlockError, BlockResult};

/// A point on the block's characteristic line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Static characteristic `y = clamp(a*u + b, min, max)`.
///
/// Configured from two points on the line; the saturation bounds are the two
/// point ordinates. Carries no dynamic state, so `reset` is a no-op and
/// simulation order never matters.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticClamp {
    max_val: f64,
    min_val: f64,
    a: f64,
    b: f64,
}

impl StaticClamp {
    /// Wire-format type tag.
    pub const TAG: &'static str = "Stat";

    /// Payload size: 4 raw doubles `(max_val, min_val, a, b)`.
    const PAYLOAD: usize = 4 * size_of::<f64>();

    /// Build the characteristic through two points.
    ///
    /// Fails when the points share an abscissa (the line would be vertical)
    /// or any coordinate is non-finite.
    pub fn new(p1: impl Into<Point>, p2: impl Into<Point>) -> BlockResult<Self> {
        let mut clamp = Self {
            max_val: 0.0,
            min_val: 0.0,
            a: 0.0,
            b: 0.0,
        };
        clamp.set_points(p1, p2)?;
        Ok(clamp)
    }

    /// Replace the characteristic. On error the previous one is kept.
    pub fn set_points(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> BlockResult<()> {
        let (p1, p2) = (p1.into(), p2.into());
        for v in [p1.x, p1.y, p2.x, p2.y] {
            ensure_finite(v, "static characteristic point")?;
        }
        if p1.x == p2.x {
            return Err(BlockError::invalid(
                "characteristic points must have distinct x coordinates",
            ));
        }
        self.a = (p2.y - p1.y) / (p2.x - p1.x);
        self.b = p1.y - self.a * p1.x;
        self.max_val = p1.y.max(p2.y);
        self.min_val = p1.y.min(p2.y);
        Ok(())
    }

    /// Reconstruct from a framed envelope.
    pub fn from_bytes(data: &[u8]) -> BlockResult<Self> {
        let expected = sl_core::bytes::LEN_PREFIX + Self::TAG.len() + Self::PAYLOAD;
        if data.len() < expected {
            return Err(CoreError::ShortBuffer {
                what: "StaticClamp envelope",
                needed: expected,
                available: data.len(),
            }
            .into());
        }
        let mut r = ByteReader::new(data);
        r.read_u32("length prefix")?;
        r.expect_tag(Self::TAG)?;
        Ok(Self {
            max_val: r.read_f64("max_val")?,
            min_val: r.read_f64("min_val")?,
            a: r.read_f64("a")?,
            b: r.read_f64("b")?,
        })
    }

    pub fn slope(&self) -> f64 {
        self.a
    }

    pub fn offset(&self) -> f64 {
        self.b
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min_val, self.max_val)
    }

    /// The canonical point pair: the two line points at the saturation
    /// bounds. For a flat characteristic the abscissae are arbitrary and
    /// `(0, b)`, `(1, b)` are returned.
    pub fn points(&self) -> (Point, Point) {
        if self.a == 0.0 {
            return ((0.0, self.b).into(), (1.0, self.b).into());
        }
        let lo = Point {
            x: (self.min_val - self.b) / self.a,
            y: self.min_val,
        };
        let hi = Point {
            x: (self.max_val - self.b) / self.a,
            y: self.max_val,
        };
        (lo, hi)
    }
}

impl SisoBlock for StaticClamp {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn simulate(&mut self, u: f64) -> f64 {
        (self.a * u + self.b).clamp(self.min_val, self.max_val)
    }

    fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(Self::PAYLOAD);
        w.put_f64(self.max_val);
        w.put_f64(self.min_val);
        w.put_f64(self.a);
        w.put_f64(self.b);
        frame(Self::TAG, &w.into_vec())
    }

    fn eq_block(&self, other: &dyn SisoBlock) -> bool {
        eq_concrete(self, other)
    }
}

//! Generator trait, shared header fields and the deserialization registry.
//!
//! Generators form a decorator chain: a constant-valued base at the core,
//! wrapped by any number of signal decorators that each add their own
//! contribution to the inner signal. The chain serializes head-first with no
//! length framing; every layer strips its own header off the front and hands
//! the remainder to the registry for the inner generator.

use downcast_rs::{Downcast, impl_downcast};
use sl_core::{ByteReader, ByteWriter, CoreError, CoreResult};
use std::sync::OnceLock;

use crate::base::BaseGenerator;
use crate::error::{GenError, GenResult};
use crate::noise::{NormalNoise, UniformNoise};
use crate::periodic::{Rectangular, Sawtooth, Sinusoid};

/// A time-indexed signal source: `simulate(t)` yields the sample at discrete
/// time `t`. Stateless in `t` except for the noise variants, which advance a
/// shared engine per call.
pub trait Generator: Downcast + std::fmt::Debug {
    /// Wire-format type tag, unique per concrete generator type.
    fn tag(&self) -> &'static str;

    /// Sample the signal at time `t`.
    fn simulate(&mut self, t: i32) -> f64;

    /// Unframed binary dump: `tag | variant fields | common fields | inner`.
    fn serialize(&self) -> Vec<u8>;

    /// Structural equality across trait objects; mismatched concrete types
    /// compare unequal.
    fn eq_gen(&self, other: &dyn Generator) -> bool;
}

impl_downcast!(Generator);

impl PartialEq for dyn Generator + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.eq_gen(other)
    }
}

pub(crate) fn eq_concrete<T>(a: &T, b: &dyn Generator) -> bool
where
    T: Generator + PartialEq,
{
    b.downcast_ref::<T>().is_some_and(|b| a == b)
}

/// Header fields every generator carries: output scale and activity window.
///
/// The window `(0, 0)` is a sentinel meaning "always active"; any other pair
/// bounds activity to `t_start <= t <= t_end` inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenCommon {
    amplitude: f64,
    t_start: i32,
    t_end: i32,
}

impl GenCommon {
    /// Serialized size: amplitude plus the two window bounds.
    pub(crate) const SIZE: usize = size_of::<f64>() + 2 * size_of::<i32>();

    pub fn new(amplitude: f64, t_start: i32, t_end: i32) -> GenResult<Self> {
        Self::validate_window(t_start, t_end)?;
        Ok(Self {
            amplitude,
            t_start,
            t_end,
        })
    }

    fn validate_window(t_start: i32, t_end: i32) -> GenResult<()> {
        if t_end < t_start {
            return Err(GenError::invalid("t_end cannot be smaller than t_start"));
        }
        Ok(())
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn set_amplitude(&mut self, amplitude: f64) {
        self.amplitude = amplitude;
    }

    pub fn window(&self) -> (i32, i32) {
        (self.t_start, self.t_end)
    }

    pub fn set_window(&mut self, t_start: i32, t_end: i32) -> GenResult<()> {
        Self::validate_window(t_start, t_end)?;
        self.t_start = t_start;
        self.t_end = t_end;
        Ok(())
    }

    /// Whether the generator contributes at time `t`.
    pub fn active(&self, t: i32) -> bool {
        (self.t_start == 0 && self.t_end == 0) || (t >= self.t_start && t <= self.t_end)
    }

    pub(crate) fn write(&self, w: &mut ByteWriter) {
        w.put_f64(self.amplitude);
        w.put_i32(self.t_start);
        w.put_i32(self.t_end);
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> CoreResult<Self> {
        Ok(Self {
            amplitude: r.read_f64("amplitude")?,
            t_start: r.read_i32("t_start")?,
            t_end: r.read_i32("t_end")?,
        })
    }
}

type Factory = fn(&[u8]) -> GenResult<Box<dyn Generator>>;

struct RegistryEntry {
    tag: &'static str,
    factory: Factory,
}

fn registry() -> &'static [RegistryEntry] {
    static REGISTRY: OnceLock<Vec<RegistryEntry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        vec![
            RegistryEntry {
                tag: BaseGenerator::TAG,
                factory: |data| Ok(Box::new(BaseGenerator::from_bytes(data)?)),
            },
            RegistryEntry {
                tag: Sinusoid::TAG,
                factory: |data| Ok(Box::new(Sinusoid::from_bytes(data)?)),
            },
            RegistryEntry {
                tag: Rectangular::TAG,
                factory: |data| Ok(Box::new(Rectangular::from_bytes(data)?)),
            },
            RegistryEntry {
                tag: Sawtooth::TAG,
                factory: |data| Ok(Box::new(Sawtooth::from_bytes(data)?)),
            },
            RegistryEntry {
                tag: UniformNoise::TAG,
                factory: |data| Ok(Box::new(UniformNoise::from_bytes(data)?)),
            },
            RegistryEntry {
                tag: NormalNoise::TAG,
                factory: |data| Ok(Box::new(NormalNoise::from_bytes(data)?)),
            },
        ]
    })
}

/// Reconstruct a generator chain from its unframed dump.
///
/// The tag sits at the very front (this family predates the length-prefixed
/// envelope and carries none); the matching factory consumes its own header
/// and recurses here for the inner generator.
pub fn deserialize(data: &[u8]) -> GenResult<Box<dyn Generator>> {
    for entry in registry() {
        if data.starts_with(entry.tag.as_bytes()) {
            tracing::debug!(tag = entry.tag, len = data.len(), "deserializing generator");
            return (entry.factory)(data);
        }
    }
    Err(GenError::Malformed(CoreError::UnknownTag {
        family: "generator",
    }))
}

//! Constant-valued base generator, the core of every decorator chain.

use sl_core::{ByteReader, ByteWriter};

use crate::error::GenResult;
use crate::generator::{GenCommon, Generator, eq_concrete};

/// Emits its configured value whenever the activity window is open, zero
/// otherwise. Wrap it in decorators to build composite signals.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseGenerator {
    common: GenCommon,
}

impl BaseGenerator {
    /// Wire-format type tag.
    pub const TAG: &'static str = "base";

    pub fn new(value: f64, t_start: i32, t_end: i32) -> GenResult<Self> {
        Ok(Self {
            common: GenCommon::new(value, t_start, t_end)?,
        })
    }

    /// Always-active constant signal.
    pub fn constant(value: f64) -> Self {
        Self {
            common: GenCommon::new(value, 0, 0).expect("zero window is valid"),
        }
    }

    /// Reconstruct from a dump; trailing bytes beyond the fixed header are
    /// ignored (an inner chain never leaves any).
    pub fn from_bytes(data: &[u8]) -> GenResult<Self> {
        let mut r = ByteReader::new(data);
        r.expect_tag(Self::TAG)?;
        Ok(Self {
            common: GenCommon::read(&mut r)?,
        })
    }

    pub fn value(&self) -> f64 {
        self.common.amplitude()
    }

    pub fn set_value(&mut self, value: f64) {
        self.common.set_amplitude(value);
    }

    pub fn common(&self) -> &GenCommon {
        &self.common
    }

    pub fn common_mut(&mut self) -> &mut GenCommon {
        &mut self.common
    }
}

impl Generator for BaseGenerator {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn simulate(&mut self, t: i32) -> f64 {
        if self.common.active(t) {
            self.common.amplitude()
        } else {
            0.0
        }
    }

    fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(Self::TAG.len() + GenCommon::SIZE);
        w.put_tag(Self::TAG);
        self.common.write(&mut w);
        w.into_vec()
    }

    fn eq_gen(&self, other: &dyn Generator) -> bool {
        eq_concrete(self, other)
    }
}

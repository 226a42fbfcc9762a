//! Random-signal decorators and the shared noise engine.
//!
//! All noise generators in the process draw from one seedable engine, so the
//! draw order depends on the interleaving of `simulate` calls across
//! instances. [`reseed_noise_engine`] makes a whole run reproducible.
//!
//! Unlike the deterministic decorators, the noise contribution is not gated
//! by the activity window; the window fields still serialize with the rest
//! of the header.

use once_cell::sync::Lazy;
use rand::distributions::Standard;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use rand_distr::{Distribution, StandardNormal};
use sl_core::{ByteReader, ByteWriter};
use std::sync::Mutex;

use crate::error::GenResult;
use crate::generator::{GenCommon, Generator, deserialize, eq_concrete};
use sl_core::numeric::ensure_nonneg;

static ENGINE: Lazy<Mutex<ChaCha12Rng>> = Lazy::new(|| Mutex::new(ChaCha12Rng::from_entropy()));

/// Reset the process-wide noise engine to a known seed.
pub fn reseed_noise_engine(seed: u64) {
    let mut engine = ENGINE.lock().unwrap_or_else(|e| e.into_inner());
    *engine = ChaCha12Rng::seed_from_u64(seed);
}

fn draw_uniform() -> f64 {
    ENGINE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .sample(Standard)
}

fn draw_standard_normal() -> f64 {
    StandardNormal.sample(&mut *ENGINE.lock().unwrap_or_else(|e| e.into_inner()))
}

/// Adds noise uniformly distributed over `[-amplitude, amplitude)`.
#[derive(Debug)]
pub struct UniformNoise {
    common: GenCommon,
    inner: Box<dyn Generator>,
}

impl UniformNoise {
    /// Wire-format type tag.
    pub const TAG: &'static str = "rand_uniform";

    pub fn new(
        inner: Box<dyn Generator>,
        amplitude: f64,
        t_start: i32,
        t_end: i32,
    ) -> GenResult<Self> {
        Ok(Self {
            common: GenCommon::new(amplitude, t_start, t_end)?,
            inner,
        })
    }

    pub fn from_bytes(data: &[u8]) -> GenResult<Self> {
        let mut r = ByteReader::new(data);
        r.expect_tag(Self::TAG)?;
        let common = GenCommon::read(&mut r)?;
        let inner = deserialize(&data[r.consumed()..])?;
        Ok(Self { common, inner })
    }

    pub fn common(&self) -> &GenCommon {
        &self.common
    }

    pub fn common_mut(&mut self) -> &mut GenCommon {
        &mut self.common
    }

    pub fn inner(&self) -> &dyn Generator {
        self.inner.as_ref()
    }
}

impl PartialEq for UniformNoise {
    fn eq(&self, other: &Self) -> bool {
        self.common == other.common && self.inner.eq_gen(other.inner.as_ref())
    }
}

impl Generator for UniformNoise {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn simulate(&mut self, t: i32) -> f64 {
        self.inner.simulate(t) + 2.0 * self.common.amplitude() * (draw_uniform() - 0.5)
    }

    fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_tag(Self::TAG);
        self.common.write(&mut w);
        w.put_bytes(&self.inner.serialize());
        w.into_vec()
    }

    fn eq_gen(&self, other: &dyn Generator) -> bool {
        eq_concrete(self, other)
    }
}

/// Adds Gaussian noise with mean `amplitude` and the given deviation.
#[derive(Debug)]
pub struct NormalNoise {
    stddev: f64,
    common: GenCommon,
    inner: Box<dyn Generator>,
}

impl NormalNoise {
    /// Wire-format type tag.
    pub const TAG: &'static str = "rand_normal";

    pub fn new(
        inner: Box<dyn Generator>,
        mean: f64,
        stddev: f64,
        t_start: i32,
        t_end: i32,
    ) -> GenResult<Self> {
        ensure_nonneg(stddev, "noise stddev must be nonnegative and finite")?;
        Ok(Self {
            stddev,
            common: GenCommon::new(mean, t_start, t_end)?,
            inner,
        })
    }

    pub fn from_bytes(data: &[u8]) -> GenResult<Self> {
        let mut r = ByteReader::new(data);
        r.expect_tag(Self::TAG)?;
        let stddev = r.read_f64("stddev")?;
        let common = GenCommon::read(&mut r)?;
        let inner = deserialize(&data[r.consumed()..])?;
        Ok(Self {
            stddev,
            common,
            inner,
        })
    }

    pub fn mean(&self) -> f64 {
        self.common.amplitude()
    }

    pub fn set_mean(&mut self, mean: f64) {
        self.common.set_amplitude(mean);
    }

    pub fn stddev(&self) -> f64 {
        self.stddev
    }

    pub fn set_stddev(&mut self, stddev: f64) -> GenResult<()> {
        ensure_nonneg(stddev, "noise stddev must be nonnegative and finite")?;
        self.stddev = stddev;
        Ok(())
    }

    pub fn common(&self) -> &GenCommon {
        &self.common
    }

    pub fn inner(&self) -> &dyn Generator {
        self.inner.as_ref()
    }
}

impl PartialEq for NormalNoise {
    fn eq(&self, other: &Self) -> bool {
        self.stddev == other.stddev
            && self.common == other.common
            && self.inner.eq_gen(other.inner.as_ref())
    }
}

impl Generator for NormalNoise {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn simulate(&mut self, t: i32) -> f64 {
        self.inner.simulate(t) + self.mean() + self.stddev * draw_standard_normal()
    }

    fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_tag(Self::TAG);
        w.put_f64(self.stddev);
        self.common.write(&mut w);
        w.put_bytes(&self.inner.serialize());
        w.into_vec()
    }

    fn eq_gen(&self, other: &dyn Generator) -> bool {
        eq_concrete(self, other)
    }
}

//! Periodic signal decorators: sine, rectangular (PWM) and sawtooth.

use sl_core::{ByteReader, ByteWriter};

use crate::error::{GenError, GenResult};
use crate::generator::{GenCommon, Generator, deserialize, eq_concrete};

/// Shared shape of the periodic decorators: common header, period and the
/// wrapped inner generator. Wire order is `period | common | inner`, right
/// after the variant tag and any variant extras.
#[derive(Debug)]
struct PeriodicCore {
    common: GenCommon,
    period: u32,
    inner: Box<dyn Generator>,
}

impl PeriodicCore {
    fn new(
        inner: Box<dyn Generator>,
        amplitude: f64,
        period: u32,
        t_start: i32,
        t_end: i32,
    ) -> GenResult<Self> {
        Self::validate_period(period)?;
        Ok(Self {
            common: GenCommon::new(amplitude, t_start, t_end)?,
            period,
            inner,
        })
    }

    fn validate_period(period: u32) -> GenResult<()> {
        if period == 0 {
            return Err(GenError::invalid("period must be at least 1"));
        }
        Ok(())
    }

    /// Continue reading after the tag and variant extras: period, common,
    /// then the inner chain from the remaining bytes.
    fn read(r: &mut ByteReader<'_>, data: &[u8]) -> GenResult<Self> {
        let period = r.read_u32("period")?;
        Self::validate_period(period)?;
        let common = GenCommon::read(r)?;
        let inner = deserialize(&data[r.consumed()..])?;
        Ok(Self {
            common,
            period,
            inner,
        })
    }

    fn write(&self, w: &mut ByteWriter) {
        w.put_u32(self.period);
        self.common.write(w);
        w.put_bytes(&self.inner.serialize());
    }

    /// Position within the current period, non-negative for any `t`.
    fn phase(&self, t: i32) -> f64 {
        (t as i64).rem_euclid(self.period as i64) as f64
    }
}

impl PartialEq for PeriodicCore {
    fn eq(&self, other: &Self) -> bool {
        self.common == other.common
            && self.period == other.period
            && self.inner.eq_gen(other.inner.as_ref())
    }
}

macro_rules! periodic_accessors {
    () => {
        pub fn period(&self) -> u32 {
            self.core.period
        }

        pub fn set_period(&mut self, period: u32) -> GenResult<()> {
            PeriodicCore::validate_period(period)?;
            self.core.period = period;
            Ok(())
        }

        pub fn common(&self) -> &GenCommon {
            &self.core.common
        }

        pub fn common_mut(&mut self) -> &mut GenCommon {
            &mut self.core.common
        }

        pub fn inner(&self) -> &dyn Generator {
            self.core.inner.as_ref()
        }
    };
}

/// Adds `amplitude * sin(2*pi * (t mod period) / period)` while active.
#[derive(Debug, PartialEq)]
pub struct Sinusoid {
    core: PeriodicCore,
}

impl Sinusoid {
    /// Wire-format type tag.
    pub const TAG: &'static str = "sin";

    pub fn new(
        inner: Box<dyn Generator>,
        amplitude: f64,
        period: u32,
        t_start: i32,
        t_end: i32,
    ) -> GenResult<Self> {
        Ok(Self {
            core: PeriodicCore::new(inner, amplitude, period, t_start, t_end)?,
        })
    }

    pub fn from_bytes(data: &[u8]) -> GenResult<Self> {
        let mut r = ByteReader::new(data);
        r.expect_tag(Self::TAG)?;
        Ok(Self {
            core: PeriodicCore::read(&mut r, data)?,
        })
    }

    periodic_accessors!();
}

impl Generator for Sinusoid {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn simulate(&mut self, t: i32) -> f64 {
        let own = if self.core.common.active(t) {
            let angle = 2.0 * std::f64::consts::PI * self.core.phase(t) / self.core.period as f64;
            self.core.common.amplitude() * angle.sin()
        } else {
            0.0
        };
        self.core.inner.simulate(t) + own
    }

    fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_tag(Self::TAG);
        self.core.write(&mut w);
        w.into_vec()
    }

    fn eq_gen(&self, other: &dyn Generator) -> bool {
        eq_concrete(self, other)
    }
}

/// Adds `amplitude` for the first `duty_cycle` fraction of each period.
#[derive(Debug, PartialEq)]
pub struct Rectangular {
    duty_cycle: f64,
    core: PeriodicCore,
}

impl Rectangular {
    /// Wire-format type tag.
    pub const TAG: &'static str = "pwm";

    const DUTY_ERR: &'static str =
        "Duty cycle should be between 0 and 1. If you want a constant signal use BaseGenerator.";

    pub fn new(
        inner: Box<dyn Generator>,
        amplitude: f64,
        period: u32,
        duty_cycle: f64,
        t_start: i32,
        t_end: i32,
    ) -> GenResult<Self> {
        Self::validate_duty_cycle(duty_cycle)?;
        Ok(Self {
            duty_cycle,
            core: PeriodicCore::new(inner, amplitude, period, t_start, t_end)?,
        })
    }

    fn validate_duty_cycle(duty_cycle: f64) -> GenResult<()> {
        if !duty_cycle.is_finite() || duty_cycle <= 0.0 || duty_cycle >= 1.0 {
            return Err(GenError::invalid(Self::DUTY_ERR));
        }
        Ok(())
    }

    pub fn from_bytes(data: &[u8]) -> GenResult<Self> {
        let mut r = ByteReader::new(data);
        r.expect_tag(Self::TAG)?;
        let duty_cycle = r.read_f64("duty_cycle")?;
        Self::validate_duty_cycle(duty_cycle)?;
        Ok(Self {
            duty_cycle,
            core: PeriodicCore::read(&mut r, data)?,
        })
    }

    pub fn duty_cycle(&self) -> f64 {
        self.duty_cycle
    }

    pub fn set_duty_cycle(&mut self, duty_cycle: f64) -> GenResult<()> {
        Self::validate_duty_cycle(duty_cycle)?;
        self.duty_cycle = duty_cycle;
        Ok(())
    }

    periodic_accessors!();
}

impl Generator for Rectangular {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn simulate(&mut self, t: i32) -> f64 {
        let high = self.core.common.active(t)
            && self.core.phase(t) < self.duty_cycle * self.core.period as f64;
        let own = if high { self.core.common.amplitude() } else { 0.0 };
        self.core.inner.simulate(t) + own
    }

    fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_tag(Self::TAG);
        w.put_f64(self.duty_cycle);
        self.core.write(&mut w);
        w.into_vec()
    }

    fn eq_gen(&self, other: &dyn Generator) -> bool {
        eq_concrete(self, other)
    }
}

/// Adds a sawtooth ramping from `-amplitude` to `+amplitude` over each
/// period.
#[derive(Debug, PartialEq)]
pub struct Sawtooth {
    core: PeriodicCore,
}

impl Sawtooth {
    /// Wire-format type tag.
    pub const TAG: &'static str = "saw";

    pub fn new(
        inner: Box<dyn Generator>,
        amplitude: f64,
        period: u32,
        t_start: i32,
        t_end: i32,
    ) -> GenResult<Self> {
        Ok(Self {
            core: PeriodicCore::new(inner, amplitude, period, t_start, t_end)?,
        })
    }

    pub fn from_bytes(data: &[u8]) -> GenResult<Self> {
        let mut r = ByteReader::new(data);
        r.expect_tag(Self::TAG)?;
        Ok(Self {
            core: PeriodicCore::read(&mut r, data)?,
        })
    }

    periodic_accessors!();
}

impl Generator for Sawtooth {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn simulate(&mut self, t: i32) -> f64 {
        let own = if self.core.common.active(t) {
            let ramp = 2.0 * self.core.phase(t) / self.core.period as f64 - 1.0;
            self.core.common.amplitude() * ramp
        } else {
            0.0
        };
        self.core.inner.simulate(t) + own
    }

    fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_tag(Self::TAG);
        self.core.write(&mut w);
        w.into_vec()
    }

    fn eq_gen(&self, other: &dyn Generator) -> bool {
        eq_concrete(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::BaseGenerator;

    fn base() -> Box<dyn Generator> {
        Box::new(BaseGenerator::constant(0.0))
    }

    #[test]
    fn sine_quarter_points() {
        let mut s = Sinusoid::new(base(), 2.5, 20, 0, 0).unwrap();
        assert!((s.simulate(0)).abs() < 1e-12);
        assert!((s.simulate(5) - 2.5).abs() < 1e-12);
        assert!((s.simulate(10)).abs() < 1e-12);
        assert!((s.simulate(15) + 2.5).abs() < 1e-12);
        // Periodicity
        assert!((s.simulate(25) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn pwm_duty_pattern() {
        let a = 1.75;
        let mut p = Rectangular::new(base(), a, 10, 0.2, 0, 0).unwrap();
        let out: Vec<f64> = (0..16).map(|t| p.simulate(t)).collect();
        let want = [
            a, a, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, a, a, 0.0, 0.0, 0.0, 0.0,
        ];
        assert_eq!(out, want);
    }

    #[test]
    fn duty_cycle_out_of_range_rejected() {
        for bad in [-0.3, 0.0, 1.0, 1.5, f64::NAN] {
            let err = Rectangular::new(base(), 1.0, 10, bad, 0, 0).unwrap_err();
            assert!(format!("{err}").contains("BaseGenerator"));
        }
        let mut p = Rectangular::new(base(), 1.0, 10, 0.5, 0, 0).unwrap();
        assert!(p.set_duty_cycle(1.0).is_err());
        assert_eq!(p.duty_cycle(), 0.5);
    }

    #[test]
    fn sawtooth_ramp() {
        let mut s = Sawtooth::new(base(), 0.625, 40, 0, 0).unwrap();
        assert!((s.simulate(0) + 0.625).abs() < 1e-14);
        assert!((s.simulate(10) + 0.3125).abs() < 1e-14);
        assert!((s.simulate(20)).abs() < 1e-14);
        assert!((s.simulate(30) - 0.3125).abs() < 1e-14);
        assert!((s.simulate(40) + 0.625).abs() < 1e-14);
    }

    #[test]
    fn decorator_adds_to_inner_signal() {
        let inner = Box::new(BaseGenerator::constant(1.0));
        let mut pwm = Rectangular::new(inner, 0.75, 8, 0.25, 1, 16).unwrap();
        let out: Vec<f64> = (0..19).map(|t| pwm.simulate(t)).collect();
        let (lo, hi) = (1.0, 1.75);
        let want = [
            lo, hi, lo, lo, lo, lo, lo, lo, hi, hi, lo, lo, lo, lo, lo, lo, hi, lo, lo,
        ];
        assert_eq!(out, want);
    }

    #[test]
    fn zero_period_rejected() {
        assert!(Sinusoid::new(base(), 1.0, 0, 0, 0).is_err());
        let mut s = Sawtooth::new(base(), 1.0, 4, 0, 0).unwrap();
        assert!(s.set_period(0).is_err());
        assert_eq!(s.period(), 4);
    }

    #[test]
    fn negative_time_phase_is_nonnegative() {
        let mut s = Sawtooth::new(base(), 1.0, 8, 0, 0).unwrap();
        // -3 mod 8 == 5
        assert_eq!(s.simulate(-3), s.simulate(5));
    }

    #[test]
    fn sine_and_sawtooth_never_compare_equal() {
        let sine = Sinusoid::new(base(), 1.0, 8, 0, 0).unwrap();
        let saw = Sawtooth::new(base(), 1.0, 8, 0, 0).unwrap();
        assert!(!sine.eq_gen(&saw));
        assert!(!saw.eq_gen(&sine));
    }
}

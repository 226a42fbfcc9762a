//! PID regulator block.

use sl_core::numeric::ensure_nonneg;
use sl_core::{ByteReader, ByteWriter, CoreError, frame};

use crate::block::{SisoBlock, eq_concrete};
use crate::error::BlockResult;

/// Discrete PID regulator.
///
/// The simulation step computes
///
/// `u_i = k * e_i + (1/ti) * sum(e_0..=e_i) + td * (e_i - e_{i-1})`
///
/// where the integral term is skipped entirely when `ti == 0`. All three
/// tunable parameters must be finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct PidRegulator {
    k: f64,
    ti: f64,
    td: f64,
    integral: f64,
    prev_e: f64,
}

impl PidRegulator {
    /// Wire-format type tag.
    pub const TAG: &'static str = "rPID";

    /// Payload size: 5 raw doubles `(k, ti, td, integral, prev_e)`.
    const PAYLOAD: usize = 5 * size_of::<f64>();

    /// Create a regulator from its tunable parameters.
    ///
    /// `ti == 0` disables the integral term.
    pub fn new(k: f64, ti: f64, td: f64) -> BlockResult<Self> {
        ensure_nonneg(k, "PID gain k must be nonnegative and finite")?;
        ensure_nonneg(ti, "PID ti must be nonnegative and finite")?;
        ensure_nonneg(td, "PID td must be nonnegative and finite")?;
        Ok(Self {
            k,
            ti,
            td,
            integral: 0.0,
            prev_e: 0.0,
        })
    }

    /// Pure-P regulator, `ti` and `td` disabled.
    pub fn proportional(k: f64) -> BlockResult<Self> {
        Self::new(k, 0.0, 0.0)
    }

    /// Reconstruct from a framed envelope.
    pub fn from_bytes(data: &[u8]) -> BlockResult<Self> {
        let expected = sl_core::bytes::LEN_PREFIX + Self::TAG.len() + Self::PAYLOAD;
        if data.len() < expected {
            return Err(CoreError::ShortBuffer {
                what: "PidRegulator envelope",
                needed: expected,
                available: data.len(),
            }
            .into());
        }
        let mut r = ByteReader::new(data);
        r.read_u32("length prefix")?;
        r.expect_tag(Self::TAG)?;
        let k = r.read_f64("k")?;
        let ti = r.read_f64("ti")?;
        let td = r.read_f64("td")?;
        let integral = r.read_f64("integral")?;
        let prev_e = r.read_f64("prev_e")?;
        let mut pid = Self::new(k, ti, td)?;
        pid.integral = integral;
        pid.prev_e = prev_e;
        Ok(pid)
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn ti(&self) -> f64 {
        self.ti
    }

    pub fn td(&self) -> f64 {
        self.td
    }

    pub fn set_k(&mut self, k: f64) -> BlockResult<()> {
        ensure_nonneg(k, "PID gain k must be nonnegative and finite")?;
        self.k = k;
        Ok(())
    }

    pub fn set_ti(&mut self, ti: f64) -> BlockResult<()> {
        ensure_nonneg(ti, "PID ti must be nonnegative and finite")?;
        self.ti = ti;
        Ok(())
    }

    pub fn set_td(&mut self, td: f64) -> BlockResult<()> {
        ensure_nonneg(td, "PID td must be nonnegative and finite")?;
        self.td = td;
        Ok(())
    }

    pub(crate) fn state(&self) -> (f64, f64) {
        (self.integral, self.prev_e)
    }

    pub(crate) fn restore_state(&mut self, integral: f64, prev_e: f64) {
        self.integral = integral;
        self.prev_e = prev_e;
    }

    fn sim_proportional(&self, e: f64) -> f64 {
        self.k * e
    }

    fn sim_integral(&mut self, e: f64) -> f64 {
        if self.ti > 0.0 {
            self.integral += e / self.ti;
            self.integral
        } else {
            0.0
        }
    }

    fn sim_derivative(&mut self, e: f64) -> f64 {
        let diff = e - self.prev_e;
        self.prev_e = e;
        self.td * diff
    }
}

impl SisoBlock for PidRegulator {
    fn tag(&self) -> &'static str {
        Self::TAG
    }

    fn simulate(&mut self, e: f64) -> f64 {
        // prev_e updates every call, even with td == 0
        self.sim_proportional(e) + self.sim_integral(e) + self.sim_derivative(e)
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_e = 0.0;
    }

    fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(Self::PAYLOAD);
        w.put_f64(self.k);
        w.put_f64(self.ti);
        w.put_f64(self.td);
        w.put_f64(self.integral);
        w.put_f64(self.prev_e);
        frame(Self::TAG, &w.into_vec())
    }

    fn eq_block(&self, other: &dyn SisoBlock) -> bool {
        eq_concrete(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_step(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i == 0 { 0.0 } else { 1.0 }).collect()
    }

    fn test_regulator() -> PidRegulator {
        let mut pid = PidRegulator::new(0.3, 15.5, 0.8).unwrap();
        for e in [0.7, 0.2, 1.3, -0.1] {
            pid.simulate(e);
        }
        pid
    }

    #[test]
    fn p_only_step_response() {
        let mut pid = PidRegulator::proportional(0.5).unwrap();
        let out: Vec<f64> = unit_step(30).into_iter().map(|e| pid.simulate(e)).collect();
        assert_eq!(out[0], 0.0);
        for y in &out[1..] {
            assert!((y - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn pi_step_response_accumulates() {
        let mut pid = PidRegulator::new(0.5, 1.0, 0.0).unwrap();
        let out: Vec<f64> = unit_step(30).into_iter().map(|e| pid.simulate(e)).collect();
        assert_eq!(out[0], 0.0);
        // 1.5, 2.5, 3.5, ... arithmetic sequence after the first nonzero step
        for (i, y) in out[1..].iter().enumerate() {
            assert!((y - (1.5 + i as f64)).abs() < 1e-9, "step {i}: {y}");
        }
    }

    #[test]
    fn pi_slow_integral() {
        let mut pid = PidRegulator::new(0.5, 10.0, 0.0).unwrap();
        let out: Vec<f64> = unit_step(30).into_iter().map(|e| pid.simulate(e)).collect();
        let expected = [0.0, 0.6, 0.7, 0.8, 0.9, 1.0];
        for (y, want) in out.iter().zip(expected) {
            assert!((y - want).abs() < 1e-9);
        }
    }

    #[test]
    fn pid_derivative_kick_on_step() {
        let mut pid = PidRegulator::new(0.5, 10.0, 0.2).unwrap();
        let out: Vec<f64> = unit_step(4).into_iter().map(|e| pid.simulate(e)).collect();
        // D term contributes only on the rising edge
        assert!((out[1] - 0.8).abs() < 1e-9);
        assert!((out[2] - 0.7).abs() < 1e-9);
    }

    #[test]
    fn invalid_params_rejected() {
        assert!(PidRegulator::new(-0.1, 0.0, 0.0).is_err());
        assert!(PidRegulator::new(0.1, -1.0, 0.0).is_err());
        assert!(PidRegulator::new(0.1, 0.0, f64::NAN).is_err());
        let mut pid = PidRegulator::proportional(1.0).unwrap();
        assert!(pid.set_ti(f64::INFINITY).is_err());
        // failed setter leaves state untouched
        assert_eq!(pid.ti(), 0.0);
    }

    #[test]
    fn negative_zero_gain_reimports() {
        // -0.0 behaves as zero, so dumps carrying it stay loadable.
        let pid = PidRegulator::new(-0.0, 0.0, 0.0).unwrap();
        let restored = PidRegulator::from_bytes(&pid.serialize()).unwrap();
        assert_eq!(pid, restored);
    }

    #[test]
    fn serialize_round_trip() {
        let pid = test_regulator();
        let dump = pid.serialize();
        let restored = PidRegulator::from_bytes(&dump).unwrap();
        assert_eq!(pid, restored);
        assert_eq!(dump, restored.serialize());
    }

    #[test]
    fn behavior_matches_after_round_trip() {
        let mut pid = test_regulator();
        let mut restored = PidRegulator::from_bytes(&pid.serialize()).unwrap();
        for e in [0.3, -0.2, -0.1, 0.0, -0.3, -0.0, 0.1, 0.15] {
            assert_eq!(pid.simulate(e), restored.simulate(e));
        }
    }

    #[test]
    fn truncated_dump_rejected() {
        let dump = test_regulator().serialize();
        assert!(PidRegulator::from_bytes(&dump[..dump.len() - 1]).is_err());
    }

    #[test]
    fn reset_clears_dynamic_state() {
        let mut pid = test_regulator();
        pid.reset();
        let fresh = PidRegulator::new(0.3, 15.5, 0.8).unwrap();
        assert_eq!(pid, fresh);
    }
}

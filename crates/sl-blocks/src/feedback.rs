//! Setpoint-driven simulation sessions.

use crate::arx::ArxModel;
use crate::block::SisoBlock;
use crate::control_loop::ControlLoop;
use crate::error::BlockResult;
use crate::pid::PidRegulator;

/// Owns a [`ControlLoop`] and drives it with a setpoint signal.
///
/// Each session carries its own state, so several simulations run side by
/// side without interfering; there is no process-wide loop instance.
#[derive(Debug)]
pub struct FeedbackSession {
    control_loop: ControlLoop,
    step_count: u64,
}

impl FeedbackSession {
    /// Wrap an existing loop.
    pub fn new(control_loop: ControlLoop) -> Self {
        Self {
            control_loop,
            step_count: 0,
        }
    }

    /// Reference closed loop: PI regulator (k=0.4, ti=2) driving a
    /// first-order noiseless ARX plant.
    pub fn reference() -> BlockResult<Self> {
        let mut control_loop = ControlLoop::new(true, 0.0);
        control_loop.push_back(Box::new(PidRegulator::new(0.4, 2.0, 0.0)?));
        control_loop.push_back(Box::new(ArxModel::with_seed(
            vec![-0.4],
            vec![0.6],
            1,
            0.0,
            0,
        )?));
        Ok(Self::new(control_loop))
    }

    /// Advance one step with the given setpoint and return the loop output.
    pub fn step(&mut self, setpoint: f64) -> f64 {
        let y = self.control_loop.simulate(setpoint);
        self.step_count += 1;
        tracing::trace!(step = self.step_count, setpoint, output = y, "loop step");
        y
    }

    /// Step with the persisted loop output overridden first, so the error
    /// for this step is `setpoint - last_output`.
    pub fn step_from(&mut self, setpoint: f64, last_output: f64) -> f64 {
        self.control_loop.prime(last_output);
        self.step(setpoint)
    }

    /// Run a whole setpoint sequence, collecting the outputs.
    pub fn run<I>(&mut self, setpoints: I) -> Vec<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        setpoints.into_iter().map(|sp| self.step(sp)).collect()
    }

    /// Steps taken since construction or the last reset.
    pub fn steps_taken(&self) -> u64 {
        self.step_count
    }

    /// Return the loop and every child to its baseline state.
    pub fn reset(&mut self) {
        self.control_loop.reset();
        self.step_count = 0;
    }

    pub fn control_loop(&self) -> &ControlLoop {
        &self.control_loop
    }

    pub fn control_loop_mut(&mut self) -> &mut ControlLoop {
        &mut self.control_loop
    }

    pub fn into_inner(self) -> ControlLoop {
        self.control_loop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_loop_tracks_constant_setpoint() {
        let mut session = FeedbackSession::reference().unwrap();
        let out = session.run(std::iter::repeat(1.0).take(10));
        let want = [
            0.0, 0.54, 1.056, 1.2708, 1.21608, 1.0614, 0.947837, 0.921115, 0.95333, 0.996295,
        ];
        for (i, (g, w)) in out.iter().zip(want).enumerate() {
            assert!((g - w).abs() < 1e-5, "step {i}: got {g}, want {w}");
        }
        assert_eq!(session.steps_taken(), 10);
    }

    #[test]
    fn override_restarts_the_error_calculation() {
        let mut session = FeedbackSession::reference().unwrap();
        session.run(std::iter::repeat(1.0).take(8));
        // Forcing last_output back to zero reproduces the first step of a
        // fresh run of the regulator-side error.
        let y = session.step_from(1.0, 0.0);
        assert_eq!(session.control_loop().prev_result(), y);
    }

    #[test]
    fn sessions_are_independent() {
        let mut a = FeedbackSession::reference().unwrap();
        let mut b = FeedbackSession::reference().unwrap();
        a.run(std::iter::repeat(5.0).take(25));
        // b is untouched by a's history.
        let first_b = b.step(1.0);
        assert_eq!(first_b, 0.0);
    }

    #[test]
    fn reset_restores_the_initial_run() {
        let mut session = FeedbackSession::reference().unwrap();
        let first = session.run((0..15).map(|i| i as f64 * 0.2));
        session.reset();
        assert_eq!(session.steps_taken(), 0);
        let second = session.run((0..15).map(|i| i as f64 * 0.2));
        assert_eq!(first, second);
    }
}

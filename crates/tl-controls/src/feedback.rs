//! Stateful controller driven by a simulation loop.

use tl_core::ensure_finite;

use crate::controller::{PidController, PidOutput, PidState, PidTerms};
use crate::error::ControlResult;
use crate::sampled::SampleGate;

/// A controller that turns measurements into a bounded actuation.
///
/// Implementors own their setpoint. `set_target` takes effect on the very
/// next `compute` call.
pub trait FeedbackController {
    /// Current setpoint.
    fn target(&self) -> f64;

    /// Replace the setpoint. Non-finite targets are ignored.
    fn set_target(&mut self, target: f64);

    /// Compute the actuation for `measurement` after `dt` seconds.
    fn compute(&mut self, measurement: f64, dt: f64) -> f64;

    /// Inclusive `(min, max)` bounds of `compute`.
    fn output_limits(&self) -> (f64, f64);

    /// Per-term breakdown of the most recent output.
    fn terms(&self) -> PidTerms {
        PidTerms::default()
    }
}

/// PID controller with its own setpoint and state.
///
/// # Example
///
/// ```
/// use tl_controls::{FeedbackController, Pid, PidController};
///
/// let config = PidController::new(5.0, 0.1, 0.1, 0.0, 300.0).unwrap();
/// let mut pid = Pid::new(config, 45.0).unwrap();
///
/// // Below target: heat.
/// assert!(pid.compute(40.0, 0.01) > 0.0);
///
/// pid.set_target(30.0);
/// assert_eq!(pid.compute(40.0, 0.01), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Pid {
    config: PidController,
    state: PidState,
    setpoint: f64,
    gate: SampleGate,
    last: Option<PidOutput>,
}

impl Pid {
    pub fn new(config: PidController, setpoint: f64) -> ControlResult<Self> {
        config.validate()?;
        ensure_finite(setpoint, "setpoint")?;
        let gate = SampleGate::new(config.sample_period);
        Ok(Self {
            config,
            state: PidState::default(),
            setpoint,
            gate,
            last: None,
        })
    }

    /// Run one update and return the full result, terms included.
    ///
    /// With a sample period configured, calls that arrive before the period
    /// has elapsed return the held previous result unchanged.
    pub fn update(&mut self, measurement: f64, dt: f64) -> PidOutput {
        let sample_dt = self.gate.poll(dt);
        if let (None, Some(held)) = (sample_dt, self.last) {
            return held;
        }

        let dt = sample_dt.unwrap_or(0.0);
        let (state, out) = self.config.update(&self.state, measurement, self.setpoint, dt);
        self.state = state;
        self.last = Some(out);
        out
    }

    /// Clear integral, history and any held output. The setpoint is kept.
    pub fn reset(&mut self) {
        self.state = PidState::default();
        self.gate.reset();
        self.last = None;
    }

    pub fn config(&self) -> &PidController {
        &self.config
    }

    pub fn state(&self) -> &PidState {
        &self.state
    }

    pub fn last_output(&self) -> Option<&PidOutput> {
        self.last.as_ref()
    }
}

impl FeedbackController for Pid {
    fn target(&self) -> f64 {
        self.setpoint
    }

    fn set_target(&mut self, target: f64) {
        if target.is_finite() {
            self.setpoint = target;
        }
    }

    fn compute(&mut self, measurement: f64, dt: f64) -> f64 {
        self.update(measurement, dt).output
    }

    fn output_limits(&self) -> (f64, f64) {
        (self.config.out_min, self.config.out_max)
    }

    fn terms(&self) -> PidTerms {
        self.last.map(|out| out.terms).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boiler_pid() -> Pid {
        let config = PidController::new(5.0, 0.1, 0.1, 0.0, 300.0).unwrap();
        Pid::new(config, 45.0).unwrap()
    }

    #[test]
    fn setpoint_change_applies_on_next_call() {
        let mut pid = boiler_pid();
        assert_eq!(pid.compute(45.0, 0.01), 0.0);

        pid.set_target(50.0);
        assert_eq!(pid.target(), 50.0);
        let out = pid.compute(45.0, 0.01);
        // Derivative on measurement: no kick, just P + I on the new error.
        assert!((out - (25.0 + 0.1 * 0.05)).abs() < 1e-9);
    }

    #[test]
    fn extreme_measurement_stays_in_bounds() {
        let mut pid = boiler_pid();
        let out = pid.compute(-1000.0, 0.01);
        assert_eq!(out, 300.0);
        let out = pid.compute(1.0e6, 0.01);
        assert_eq!(out, 0.0);
    }

    #[test]
    fn p_only_at_target_outputs_zero() {
        let config = PidController::new(5.0, 0.0, 0.0, 0.0, 300.0).unwrap();
        let mut pid = Pid::new(config, 45.0).unwrap();
        for _ in 0..100 {
            assert_eq!(pid.compute(45.0, 0.01), 0.0);
        }
    }

    #[test]
    fn identical_controllers_agree() {
        let mut a = boiler_pid();
        let mut b = boiler_pid();
        let inputs = [(45.0, 0.0), (44.9, 0.005), (44.8, 0.006), (46.1, 0.004), (47.0, 0.01)];
        for (pv, dt) in inputs {
            assert_eq!(a.compute(pv, dt).to_bits(), b.compute(pv, dt).to_bits());
        }
    }

    #[test]
    fn sample_period_holds_output() {
        let config = PidController::new(1.0, 0.0, 0.0, -100.0, 100.0)
            .unwrap()
            .with_sample_period(0.1)
            .unwrap();
        let mut pid = Pid::new(config, 10.0).unwrap();

        assert_eq!(pid.compute(0.0, 0.05), 10.0);
        // Held: measurement changed but the period has not elapsed.
        assert_eq!(pid.compute(5.0, 0.05), 10.0);
        assert_eq!(pid.compute(5.0, 0.05), 5.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = boiler_pid();
        for _ in 0..10 {
            pid.compute(40.0, 0.1);
        }
        assert!(pid.state().integral > 0.0);

        pid.reset();
        assert_eq!(pid.state(), &PidState::default());
        assert!(pid.last_output().is_none());
        assert_eq!(pid.target(), 45.0);
    }

    #[test]
    fn terms_track_last_output() {
        let mut pid = boiler_pid();
        assert_eq!(pid.terms(), PidTerms::default());
        pid.compute(44.0, 0.01);
        assert!((pid.terms().proportional - 5.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_target_is_ignored() {
        let mut pid = boiler_pid();
        pid.compute(45.0, 0.01);

        pid.set_target(f64::NAN);
        assert_eq!(pid.target(), 45.0);
        pid.set_target(f64::INFINITY);
        assert_eq!(pid.target(), 45.0);
        assert_eq!(pid.compute(45.0, 0.01), 0.0);

        pid.set_target(50.0);
        let out = pid.compute(40.0, 0.01);
        assert!(pid.state().integral.is_finite());
        assert!(out > 0.0);
    }

    #[test]
    fn rejects_non_finite_setpoint() {
        let config = PidController::new(5.0, 0.1, 0.1, 0.0, 300.0).unwrap();
        assert!(Pid::new(config, f64::NAN).is_err());
    }
}

//! PID controller configuration and the pure update step.
//!
//! `PidController::update` never mutates anything: it takes the previous
//! [`PidState`] and returns the next one together with the output. Callers
//! that want an object with a setpoint use [`crate::Pid`].

use serde::{Deserialize, Serialize};
use tl_core::{ensure_bounds, ensure_finite, sanitize_dt};

use crate::error::{ControlError, ControlResult};

/// Which signal the derivative term differentiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeMode {
    /// `-d(measurement)/dt`. No kick when the setpoint steps.
    #[default]
    OnMeasurement,
    /// `d(error)/dt`. Reacts to setpoint steps with a spike.
    OnError,
}

/// Integral windup handling while the output is saturated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiWindup {
    /// Freeze accumulation when the output is clamped and the error pushes
    /// further into the clamp.
    #[default]
    Conditional,
    /// Always accumulate. Overshoot after long saturation is accepted.
    None,
}

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
    /// Minimum output value.
    pub out_min: f64,
    /// Maximum output value.
    pub out_max: f64,
    /// Symmetric limit on the integral accumulator (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<f64>,
    #[serde(default)]
    pub derivative: DerivativeMode,
    #[serde(default)]
    pub anti_windup: AntiWindup,
    /// Minimum time between real updates (seconds). Calls arriving sooner
    /// return the previous output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_period: Option<f64>,
}

impl PidController {
    /// Create a new PID controller.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain
    /// * `kd` - Derivative gain
    /// * `out_min` - Minimum output
    /// * `out_max` - Maximum output
    ///
    /// # Errors
    ///
    /// Returns an error if a gain is not finite or `out_min > out_max`.
    pub fn new(kp: f64, ki: f64, kd: f64, out_min: f64, out_max: f64) -> ControlResult<Self> {
        let controller = Self {
            kp,
            ki,
            kd,
            out_min,
            out_max,
            integral_limit: None,
            derivative: DerivativeMode::default(),
            anti_windup: AntiWindup::default(),
            sample_period: None,
        };
        controller.validate()?;
        Ok(controller)
    }

    /// Check a configuration built by hand or deserialized.
    pub fn validate(&self) -> ControlResult<()> {
        ensure_finite(self.kp, "kp")?;
        ensure_finite(self.ki, "ki")?;
        ensure_finite(self.kd, "kd")?;
        ensure_bounds(self.out_min, self.out_max, "output limits")?;
        if let Some(limit) = self.integral_limit {
            if limit.is_nan() || limit < 0.0 {
                return Err(ControlError::InvalidArg {
                    what: "integral_limit must be non-negative",
                });
            }
        }
        if let Some(period) = self.sample_period {
            if !(period.is_finite() && period > 0.0) {
                return Err(ControlError::InvalidArg {
                    what: "sample_period must be positive",
                });
            }
        }
        Ok(())
    }

    /// Set integral windup limit.
    pub fn with_integral_limit(mut self, limit: f64) -> ControlResult<Self> {
        self.integral_limit = Some(limit);
        self.validate()?;
        Ok(self)
    }

    pub fn with_derivative(mut self, mode: DerivativeMode) -> Self {
        self.derivative = mode;
        self
    }

    pub fn with_anti_windup(mut self, policy: AntiWindup) -> Self {
        self.anti_windup = policy;
        self
    }

    /// Set the minimum period between real updates.
    pub fn with_sample_period(mut self, period: f64) -> ControlResult<Self> {
        self.sample_period = Some(period);
        self.validate()?;
        Ok(self)
    }

    /// Clamp a raw output into the configured limits. NaN maps to `out_min`.
    pub fn clamp_output(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            self.out_min
        } else {
            raw.clamp(self.out_min, self.out_max)
        }
    }

    fn clamp_integral(&self, integral: f64) -> f64 {
        match self.integral_limit {
            Some(limit) => integral.clamp(-limit, limit),
            None => integral,
        }
    }

    /// Compute controller output.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller state (integral and history)
    /// * `pv` - Process variable (measured value)
    /// * `sp` - Setpoint (desired value)
    /// * `dt` - Time since last update (seconds)
    ///
    /// # Returns
    ///
    /// Updated state and output value.
    pub fn update(&self, state: &PidState, pv: f64, sp: f64, dt: f64) -> (PidState, PidOutput) {
        // Error: e = sp - pv (positive error means PV is below setpoint)
        let error = sp - pv;
        if !error.is_finite() {
            // Nothing sensible to integrate or differentiate. State is left
            // untouched so a later finite input recovers.
            let output = self.clamp_output(f64::NAN);
            return (state.clone(), PidOutput::new(output, PidTerms::default(), true));
        }
        let p_term = self.kp * error;

        let Some(dt) = sanitize_dt(dt) else {
            // Degenerate step: keep the accumulated integral, add nothing new.
            let i_term = self.ki * state.integral;
            let raw = p_term + i_term;
            let output = self.clamp_output(raw);
            let new_state = PidState {
                integral: state.integral,
                last_measurement: Some(pv),
                last_error: Some(error),
            };
            let terms = PidTerms {
                proportional: p_term,
                integral: i_term,
                derivative: 0.0,
            };
            return (new_state, PidOutput::new(output, terms, output != raw));
        };

        let rate = match self.derivative {
            DerivativeMode::OnMeasurement => state
                .last_measurement
                .map_or(0.0, |last| -(pv - last) / dt),
            DerivativeMode::OnError => state.last_error.map_or(0.0, |last| (error - last) / dt),
        };
        let d_term = self.kd * rate;

        let candidate = self.clamp_integral(state.integral + error * dt);
        let mut integral = candidate;
        let mut raw = p_term + self.ki * candidate + d_term;
        let mut output = self.clamp_output(raw);

        // Anti-windup: saturated and the new error pushes further in.
        if self.anti_windup == AntiWindup::Conditional
            && output != raw
            && self.ki * error * (raw - output) > 0.0
        {
            integral = state.integral;
            raw = p_term + self.ki * integral + d_term;
            output = self.clamp_output(raw);
        }

        let new_state = PidState {
            integral,
            last_measurement: Some(pv),
            last_error: Some(error),
        };
        let terms = PidTerms {
            proportional: p_term,
            integral: self.ki * integral,
            derivative: d_term,
        };

        (new_state, PidOutput::new(output, terms, output != raw))
    }
}

/// PID controller state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PidState {
    /// Integral accumulator (error * seconds, before `ki`).
    pub integral: f64,
    /// Measurement seen on the previous call.
    pub last_measurement: Option<f64>,
    /// Error seen on the previous call.
    pub last_error: Option<f64>,
}

/// Contribution of each term to the last output, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidTerms {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

impl PidTerms {
    pub fn sum(&self) -> f64 {
        self.proportional + self.integral + self.derivative
    }
}

/// Result of one controller update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidOutput {
    /// Clamped control output.
    pub output: f64,
    pub terms: PidTerms,
    /// True when clamping changed the raw output.
    pub saturated: bool,
}

impl PidOutput {
    fn new(output: f64, terms: PidTerms, saturated: bool) -> Self {
        Self {
            output,
            terms,
            saturated,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn output_always_within_limits(
            pv in -1.0e4_f64..1.0e4_f64,
            sp in -1.0e4_f64..1.0e4_f64,
            dt in 0.0_f64..1.0_f64,
            integral in -1.0e6_f64..1.0e6_f64,
        ) {
            let pid = PidController::new(5.0, 0.1, 0.1, 0.0, 300.0).unwrap();
            let state = PidState { integral, last_measurement: Some(pv * 0.5), last_error: None };
            let (_, out) = pid.update(&state, pv, sp, dt);
            prop_assert!(out.output >= 0.0 && out.output <= 300.0);
        }

        #[test]
        fn identical_inputs_give_identical_outputs(
            steps in prop::collection::vec((0.0_f64..100.0_f64, 0.0_f64..0.1_f64), 1..50),
        ) {
            let pid = PidController::new(5.0, 0.1, 0.1, 0.0, 300.0).unwrap();
            let mut a = PidState::default();
            let mut b = PidState::default();
            for (pv, dt) in steps {
                let (next_a, out_a) = pid.update(&a, pv, 45.0, dt);
                let (next_b, out_b) = pid.update(&b, pv, 45.0, dt);
                prop_assert_eq!(out_a.output.to_bits(), out_b.output.to_bits());
                a = next_a;
                b = next_b;
            }
        }
    }
}

//! Feedback control primitives for thermoloop.
//!
//! The controller is split the same way throughout:
//! - [`PidController`] holds the fixed configuration (gains, output bounds,
//!   derivative and anti-windup policy) and exposes a pure `update` step.
//! - [`PidState`] holds what changes between calls (integral, history).
//! - [`Pid`] owns both plus the mutable setpoint and is what a loop drives
//!   through the [`FeedbackController`] trait.
//!
//! # Policies
//!
//! - Derivative acts on the measurement by default, so setpoint steps do not
//!   produce a derivative kick. Derivative on error is selectable.
//! - Anti-windup defaults to conditional integration: accumulation is frozen
//!   while the output is saturated and the error would drive it further in.
//! - A zero, negative or non-finite `dt` skips integral accumulation and
//!   contributes no derivative; the proportional term still acts.

pub mod controller;
pub mod error;
pub mod feedback;
pub mod sampled;

pub use controller::{AntiWindup, DerivativeMode, PidController, PidOutput, PidState, PidTerms};
pub use error::{ControlError, ControlResult};
pub use feedback::{FeedbackController, Pid};
pub use sampled::SampleGate;

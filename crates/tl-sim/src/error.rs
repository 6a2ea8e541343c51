//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while configuring a simulation.
///
/// Running a configured loop cannot fail: degenerate time steps are absorbed
/// by the controller and plant and only counted in the record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid configuration: {what}")]
    InvalidConfiguration { what: &'static str },

    #[error("Controller error: {0}")]
    Control(#[from] tl_controls::ControlError),

    #[error(transparent)]
    Core(#[from] tl_core::TlError),
}

pub type SimResult<T> = Result<T, SimError>;

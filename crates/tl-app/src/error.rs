//! Error types for the tl-app service layer.

/// Application error type wrapping the backend crates' errors behind one
/// interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Scenario validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Controller error: {0}")]
    Control(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tl-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<tl_project::ProjectError> for AppError {
    fn from(err: tl_project::ProjectError) -> Self {
        match err {
            tl_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<tl_project::ValidationError> for AppError {
    fn from(err: tl_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<tl_controls::ControlError> for AppError {
    fn from(err: tl_controls::ControlError) -> Self {
        AppError::Control(err.to_string())
    }
}

impl From<tl_sim::SimError> for AppError {
    fn from(err: tl_sim::SimError) -> Self {
        match err {
            tl_sim::SimError::InvalidConfiguration { what } => {
                AppError::InvalidConfiguration(what.to_string())
            }
            other => AppError::Simulation(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

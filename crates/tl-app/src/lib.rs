//! Shared application service layer for thermoloop.
//!
//! Turns a validated [`tl_project::Scenario`] into a running loop, reports
//! progress while it runs and summarises the trajectory afterwards. The CLI
//! is a thin wrapper over this crate.

pub mod compile;
pub mod error;
pub mod export;
pub mod metrics;
pub mod progress;
pub mod run_service;

pub use compile::{build_controller, build_options, build_plant, build_schedule};
pub use error::{AppError, AppResult};
pub use export::{record_to_csv, record_to_json};
pub use metrics::{LoopMetrics, compute_loop_metrics, metrics_for_record};
pub use progress::{LoopProgress, RunProgressEvent, RunStage};
pub use run_service::{
    RunOptions, RunReport, RunTimingSummary, run_scenario, run_scenario_with_progress,
};

//! Progress events streamed while a scenario runs.

use tl_controls::PidTerms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Compiling,
    Running,
    ComputingMetrics,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::Compiling => "compiling",
            RunStage::Running => "running",
            RunStage::ComputingMetrics => "metrics",
            RunStage::Completed => "completed",
        }
    }
}

/// Snapshot of the loop after one iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopProgress {
    pub sim_time_s: f64,
    pub duration_s: f64,
    pub fraction_complete: f64,
    pub step: usize,
    pub measurement: f64,
    pub setpoint: f64,
    pub output: f64,
    pub terms: PidTerms,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub loop_progress: Option<LoopProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            loop_progress: None,
        }
    }
}

//! Scenario execution service.

use std::time::{Duration, Instant};

use tl_controls::{FeedbackController, Pid};
use tl_project::schema::{ClockDef, Scenario};
use tl_project::validate_scenario;
use tl_sim::{
    Boiler, Clock, LogicalClock, SetpointSchedule, SimOptions, SimRecord, Simulation, WallClock,
};
use tracing::info;

use crate::compile;
use crate::error::AppResult;
use crate::metrics::{LoopMetrics, metrics_for_record};
use crate::progress::{LoopProgress, RunProgressEvent, RunStage};

/// Overrides applied on top of the scenario before it runs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub duration_s: Option<f64>,
    pub clock: Option<ClockDef>,
}

#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub compile_time_s: f64,
    pub run_time_s: f64,
    pub total_time_s: f64,
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Scenario as actually run, overrides included.
    pub scenario: Scenario,
    pub record: SimRecord,
    pub metrics: LoopMetrics,
    pub timing: RunTimingSummary,
}

type ProgressCallback<'a> = Option<&'a mut dyn FnMut(RunProgressEvent)>;

fn emit_progress(
    progress_cb: &mut ProgressCallback<'_>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    loop_progress: Option<LoopProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            loop_progress,
        });
    }
}

/// Run a scenario to completion.
pub fn run_scenario(scenario: &Scenario, options: &RunOptions) -> AppResult<RunReport> {
    run_scenario_with_progress(scenario, options, None)
}

/// Run a scenario and stream a progress event after every loop iteration.
pub fn run_scenario_with_progress(
    scenario: &Scenario,
    options: &RunOptions,
    mut progress_cb: ProgressCallback<'_>,
) -> AppResult<RunReport> {
    let started = Instant::now();

    let mut scenario = scenario.clone();
    if let Some(duration) = options.duration_s {
        scenario.run.duration_s = duration;
    }
    if let Some(clock) = &options.clock {
        scenario.run.clock = clock.clone();
    }
    validate_scenario(&scenario)?;

    emit_progress(
        &mut progress_cb,
        RunStage::Compiling,
        started,
        Some(format!("Compiling scenario '{}'", scenario.name)),
        None,
    );
    let controller = compile::build_controller(&scenario.controller)?;
    let limits = controller.output_limits();
    let plant = compile::build_plant(&scenario.plant)?;
    let schedule = compile::build_schedule(&scenario.run.setpoint_changes)?;
    let sim_options = compile::build_options(&scenario.run);
    let compile_time_s = started.elapsed().as_secs_f64();

    info!(
        scenario = %scenario.name,
        duration_s = sim_options.duration,
        clock = ?scenario.run.clock,
        "running scenario"
    );
    emit_progress(&mut progress_cb, RunStage::Running, started, None, None);
    let run_started = Instant::now();
    let parts = LoopParts {
        controller,
        plant,
        schedule,
        options: sim_options,
    };
    let record = match scenario.run.clock {
        ClockDef::Logical { step_s } => {
            execute(parts, LogicalClock::new(step_s)?, started, &mut progress_cb)?
        }
        ClockDef::WallClock { pace_ms } => execute(
            parts,
            WallClock::new(Duration::from_millis(pace_ms)),
            started,
            &mut progress_cb,
        )?,
    };
    let run_time_s = run_started.elapsed().as_secs_f64();

    emit_progress(&mut progress_cb, RunStage::ComputingMetrics, started, None, None);
    let metrics = metrics_for_record(&record, limits);
    info!(
        samples = record.len(),
        degenerate_steps = record.degenerate_steps,
        overshoot_pct = metrics.overshoot_pct,
        steady_state_error = metrics.steady_state_error,
        "run finished"
    );

    let total_time_s = started.elapsed().as_secs_f64();
    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some(format!("{} samples", record.len())),
        None,
    );

    Ok(RunReport {
        scenario,
        record,
        metrics,
        timing: RunTimingSummary {
            compile_time_s,
            run_time_s,
            total_time_s,
        },
    })
}

struct LoopParts {
    controller: Pid,
    plant: Boiler,
    schedule: SetpointSchedule,
    options: SimOptions,
}

fn execute<K: Clock>(
    parts: LoopParts,
    clock: K,
    started: Instant,
    progress_cb: &mut ProgressCallback<'_>,
) -> AppResult<SimRecord> {
    let duration_s = parts.options.duration;
    let mut sim = Simulation::new(
        parts.controller,
        parts.plant,
        clock,
        parts.schedule,
        parts.options,
    )?;

    let mut step = 0;
    sim.run_with_observer(|sample| {
        step += 1;
        if progress_cb.is_none() {
            return;
        }
        let fraction_complete = if duration_s > 0.0 {
            (sample.elapsed / duration_s).clamp(0.0, 1.0)
        } else {
            1.0
        };
        emit_progress(
            progress_cb,
            RunStage::Running,
            started,
            None,
            Some(LoopProgress {
                sim_time_s: sample.elapsed,
                duration_s,
                fraction_complete,
                step,
                measurement: sample.measurement,
                setpoint: sample.setpoint,
                output: sample.output,
                terms: sample.terms,
            }),
        );
    });
    Ok(sim.into_record())
}

//! Scenario definitions to runtime objects.

use tl_controls::{AntiWindup, DerivativeMode, Pid, PidController};
use tl_project::schema::{
    AntiWindupDef, ControllerDef, DerivativeDef, PlantDef, RunDef, SetpointChangeDef,
};
use tl_sim::{Boiler, BoilerParams, SetpointChange, SetpointSchedule, SimOptions};

use crate::error::{AppError, AppResult};

/// Loops longer than this many iterations are cut off.
pub const DEFAULT_MAX_STEPS: usize = 10_000_000;

pub fn build_controller(def: &ControllerDef) -> AppResult<Pid> {
    let mut config = PidController::new(def.kp, def.ki, def.kd, def.out_min, def.out_max)?
        .with_derivative(match def.derivative {
            DerivativeDef::OnMeasurement => DerivativeMode::OnMeasurement,
            DerivativeDef::OnError => DerivativeMode::OnError,
        })
        .with_anti_windup(match def.anti_windup {
            AntiWindupDef::Conditional => AntiWindup::Conditional,
            AntiWindupDef::None => AntiWindup::None,
        });
    if let Some(limit) = def.integral_limit {
        config = config.with_integral_limit(limit)?;
    }
    if let Some(period) = def.sample_period_s {
        config = config.with_sample_period(period)?;
    }
    Ok(Pid::new(config, def.setpoint)?)
}

pub fn build_plant(def: &PlantDef) -> AppResult<Boiler> {
    let delay_steps = usize::try_from(def.delay_steps).map_err(|_| {
        AppError::InvalidConfiguration(format!(
            "delay_steps must be non-negative, got {}",
            def.delay_steps
        ))
    })?;
    let params = BoilerParams {
        initial_temperature: def.initial_temperature,
        delay_steps,
        heating_gain: def.heating_gain,
        loss_coefficient: def.loss_coefficient,
        max_temperature: def.max_temperature,
        display_decimals: def.display_decimals,
    };
    Ok(Boiler::new(params)?)
}

pub fn build_schedule(defs: &[SetpointChangeDef]) -> AppResult<SetpointSchedule> {
    let changes = defs
        .iter()
        .map(|def| SetpointChange {
            at: def.at_s,
            value: def.value,
        })
        .collect();
    Ok(SetpointSchedule::new(changes)?)
}

pub fn build_options(run: &RunDef) -> SimOptions {
    SimOptions {
        duration: run.duration_s,
        max_steps: run.max_steps.unwrap_or(DEFAULT_MAX_STEPS),
    }
}

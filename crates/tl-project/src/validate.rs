//! Scenario validation logic.
//!
//! Everything here runs before a loop is built, so a bad scenario never
//! mutates any simulation state.

use crate::schema::{ClockDef, ControllerDef, PlantDef, RunDef, Scenario, LATEST_VERSION};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite"))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(invalid(field, value, "must be non-negative"));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(invalid(field, value, "must be positive"));
    }
    Ok(())
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }
    if scenario.name.trim().is_empty() {
        return Err(invalid("name", "", "must not be empty"));
    }

    validate_plant(&scenario.plant)?;
    validate_controller(&scenario.controller)?;
    validate_run(&scenario.run)?;
    Ok(())
}

fn validate_plant(plant: &PlantDef) -> Result<(), ValidationError> {
    finite("plant.initial_temperature", plant.initial_temperature)?;
    if plant.delay_steps < 0 {
        return Err(invalid(
            "plant.delay_steps",
            plant.delay_steps,
            "must be non-negative",
        ));
    }
    non_negative("plant.heating_gain", plant.heating_gain)?;
    non_negative("plant.loss_coefficient", plant.loss_coefficient)?;
    if plant.max_temperature.is_nan() {
        return Err(invalid("plant.max_temperature", "NaN", "must be a number"));
    }
    if plant.initial_temperature > plant.max_temperature {
        return Err(invalid(
            "plant.initial_temperature",
            plant.initial_temperature,
            "exceeds max_temperature",
        ));
    }
    if plant.display_decimals > 12 {
        return Err(invalid(
            "plant.display_decimals",
            plant.display_decimals,
            "must be at most 12",
        ));
    }
    Ok(())
}

fn validate_controller(controller: &ControllerDef) -> Result<(), ValidationError> {
    finite("controller.kp", controller.kp)?;
    finite("controller.ki", controller.ki)?;
    finite("controller.kd", controller.kd)?;
    finite("controller.setpoint", controller.setpoint)?;
    tl_core::ensure_bounds(controller.out_min, controller.out_max, "output limits").map_err(
        |e| {
            invalid(
                "controller.out_min/out_max",
                format!("[{}, {}]", controller.out_min, controller.out_max),
                &e.to_string(),
            )
        },
    )?;
    if let Some(limit) = controller.integral_limit {
        non_negative("controller.integral_limit", limit)?;
    }
    if let Some(period) = controller.sample_period_s {
        positive("controller.sample_period_s", period)?;
    }
    Ok(())
}

fn validate_run(run: &RunDef) -> Result<(), ValidationError> {
    non_negative("run.duration_s", run.duration_s)?;
    if let ClockDef::Logical { step_s } = run.clock {
        positive("run.clock.step_s", step_s)?;
    }
    for (i, change) in run.setpoint_changes.iter().enumerate() {
        non_negative(&format!("run.setpoint_changes[{i}].at_s"), change.at_s)?;
        finite(&format!("run.setpoint_changes[{i}].value"), change.value)?;
    }
    if run.max_steps == Some(0) {
        return Err(invalid("run.max_steps", 0, "must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_is_valid() {
        assert!(validate_scenario(&Scenario::default()).is_ok());
    }

    #[test]
    fn zero_delay_is_allowed() {
        let mut scenario = Scenario::default();
        scenario.plant.delay_steps = 0;
        assert!(validate_scenario(&scenario).is_ok());
    }

    #[test]
    fn inverted_bounds_rejected() {
        let mut scenario = Scenario::default();
        scenario.controller.out_min = 300.0;
        scenario.controller.out_max = 0.0;
        let err = validate_scenario(&scenario).unwrap_err();
        assert!(err.to_string().contains("out_min/out_max"));
    }

    #[test]
    fn future_version_rejected() {
        let mut scenario = Scenario::default();
        scenario.version = LATEST_VERSION + 1;
        assert_eq!(
            validate_scenario(&scenario),
            Err(ValidationError::UnsupportedVersion {
                version: LATEST_VERSION + 1
            })
        );
    }
}

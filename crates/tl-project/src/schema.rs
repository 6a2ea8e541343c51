//! Scenario schema definitions.

use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    pub plant: PlantDef,
    pub controller: ControllerDef,
    pub run: RunDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantDef {
    pub initial_temperature: f64,
    /// Transport delay in loop iterations. Signed so that negative values
    /// reach validation instead of failing to parse.
    pub delay_steps: i64,
    pub heating_gain: f64,
    pub loss_coefficient: f64,
    pub max_temperature: f64,
    #[serde(default = "default_display_decimals")]
    pub display_decimals: u32,
}

fn default_display_decimals() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeDef {
    #[default]
    OnMeasurement,
    OnError,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AntiWindupDef {
    #[default]
    Conditional,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerDef {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub out_min: f64,
    pub out_max: f64,
    pub setpoint: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<f64>,
    #[serde(default)]
    pub derivative: DerivativeDef,
    #[serde(default)]
    pub anti_windup: AntiWindupDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_period_s: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClockDef {
    /// Deterministic fixed step.
    Logical { step_s: f64 },
    /// Real time, sleeping `pace_ms` after every iteration.
    WallClock {
        #[serde(default)]
        pace_ms: u64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetpointChangeDef {
    pub at_s: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDef {
    pub duration_s: f64,
    pub clock: ClockDef,
    #[serde(default)]
    pub setpoint_changes: Vec<SetpointChangeDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
}

impl Default for Scenario {
    /// Water boiler demo: hold 45, step to 50 at t=2 s, run 10 s.
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            name: "water-boiler".to_string(),
            plant: PlantDef {
                initial_temperature: 45.0,
                delay_steps: 30,
                heating_gain: 10.0,
                loss_coefficient: 0.05,
                max_temperature: 100.0,
                display_decimals: default_display_decimals(),
            },
            controller: ControllerDef {
                kp: 5.0,
                ki: 0.1,
                kd: 0.1,
                out_min: 0.0,
                out_max: 300.0,
                setpoint: 45.0,
                integral_limit: None,
                derivative: DerivativeDef::default(),
                anti_windup: AntiWindupDef::default(),
                sample_period_s: None,
            },
            run: RunDef {
                duration_s: 10.0,
                clock: ClockDef::Logical { step_s: 0.001 },
                setpoint_changes: vec![SetpointChangeDef {
                    at_s: 2.0,
                    value: 50.0,
                }],
                max_steps: None,
            },
        }
    }
}

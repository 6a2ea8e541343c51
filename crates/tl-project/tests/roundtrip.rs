use std::path::PathBuf;

use tl_project::schema::*;
use tl_project::{ProjectError, from_yaml_str, load_scenario, to_yaml_string};

fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../scenarios")
}

#[test]
fn yaml_roundtrip_preserves_scenario() {
    let scenario = Scenario::default();
    let yaml = to_yaml_string(&scenario).expect("serialize");
    let parsed = from_yaml_str(&yaml).expect("parse");
    assert_eq!(parsed, scenario);
}

#[test]
fn optional_fields_take_defaults() {
    let yaml = r#"
version: 1
name: minimal
plant:
  initial_temperature: 20.0
  delay_steps: 0
  heating_gain: 1.0
  loss_coefficient: 0.0
  max_temperature: 100.0
controller:
  kp: 1.0
  ki: 0.0
  kd: 0.0
  out_min: 0.0
  out_max: 10.0
  setpoint: 25.0
run:
  duration_s: 1.0
  clock:
    type: logical
    step_s: 0.01
"#;
    let scenario = from_yaml_str(yaml).expect("parse");
    assert_eq!(scenario.plant.display_decimals, 1);
    assert_eq!(scenario.controller.derivative, DerivativeDef::OnMeasurement);
    assert_eq!(scenario.controller.anti_windup, AntiWindupDef::Conditional);
    assert!(scenario.run.setpoint_changes.is_empty());
}

#[test]
fn wall_clock_parses() {
    let mut scenario = Scenario::default();
    scenario.run.clock = ClockDef::WallClock { pace_ms: 5 };
    let yaml = to_yaml_string(&scenario).unwrap();
    assert!(yaml.contains("wall_clock"));
    assert_eq!(from_yaml_str(&yaml).unwrap().run.clock, scenario.run.clock);
}

#[test]
fn invalid_yaml_is_rejected_after_parse() {
    let mut scenario = Scenario::default();
    scenario.plant.delay_steps = -3;
    let yaml = serde_yaml::to_string(&scenario).unwrap();
    assert!(matches!(
        from_yaml_str(&yaml),
        Err(ProjectError::Validation(_))
    ));
}

#[test]
fn bundled_scenarios_load() {
    for name in ["water_boiler.yaml", "no_delay.yaml", "wall_clock.yaml"] {
        let path = scenarios_dir().join(name);
        let scenario = load_scenario(&path)
            .unwrap_or_else(|e| panic!("failed to load {}: {e}", path.display()));
        assert!(!scenario.name.is_empty());
    }
}

#[test]
fn bundled_water_boiler_matches_default() {
    let scenario = load_scenario(&scenarios_dir().join("water_boiler.yaml")).unwrap();
    assert_eq!(scenario, Scenario::default());
}

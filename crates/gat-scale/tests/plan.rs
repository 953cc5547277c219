//! Scaling plan file loading tests

mod common;

use std::fs;

use common::*;
use gat_scale::{
    load_parameters_from_path, load_plan_from_path, DistributionMode, Priority, ScalingConvention,
    ScalingReport,
};
use tempfile::tempdir;

const YAML_PLAN: &str = r#"
label: morning ramp
asked: 270
parameters:
  priority: respect_volume_asked
scalable:
  type: proportional
  percentages: [70, 20, 10]
  children:
    - { type: generator, id: g1 }
    - { type: generator, id: g2 }
    - { type: generator, id: g3, min: -10, max: 80 }
"#;

#[test]
fn yaml_plan_runs_against_network() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("plan.yaml");
    fs::write(&path, YAML_PLAN).unwrap();

    let plan = load_plan_from_path(&path).unwrap();
    assert_eq!(plan.label, "morning ramp");
    assert_eq!(plan.parameters.priority, Priority::RespectVolumeAsked);

    let mut network = unit_network();
    let mut reports: Vec<ScalingReport> = Vec::new();
    let done = plan.run(&mut network, &mut reports).unwrap();
    assert_close(done, 270.0);
    assert_close(target_p(&network, "g3"), 70.0);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].label, "morning ramp");
    assert_eq!(reports[0].distribution_mode, None);
}

#[test]
fn json_plan_with_defaults() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("plan.json");
    fs::write(
        &path,
        r#"{"asked": -30, "scalable": {"type": "stack", "children": [{"type": "load", "id": "l1"}]}}"#,
    )
    .unwrap();

    let plan = load_plan_from_path(&path).unwrap();
    assert_eq!(plan.label, "scaling");
    assert_eq!(plan.parameters.scaling_convention, ScalingConvention::Generator);

    let mut network = unit_network();
    let done = plan.run(&mut network, &mut Vec::<ScalingReport>::new()).unwrap();
    assert_close(done, -30.0);
    assert_close(p0(&network, "l1"), 30.0);
}

#[test]
fn invalid_tree_is_rejected_at_load_time() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("plan.yml");
    fs::write(
        &path,
        "asked: 10\nscalable:\n  type: proportional\n  percentages: [60, 30]\n  children:\n    - { type: generator, id: g1 }\n    - { type: generator, id: g2 }\n",
    )
    .unwrap();

    let err = load_plan_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("sum of percentages"));
}

#[test]
fn missing_file_names_the_path() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("absent.yaml");
    let err = load_parameters_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn parameters_file_without_extension() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("params");
    fs::write(
        &path,
        r#"{"scaling_convention": "load", "distribution_mode": "proportional_to_p0", "scaling_value": 12.5}"#,
    )
    .unwrap();

    let params = load_parameters_from_path(&path).unwrap();
    assert_eq!(params.scaling_convention, ScalingConvention::Load);
    assert_eq!(params.distribution_mode, DistributionMode::ProportionalToP0);
    assert_eq!(params.scaling_value, 12.5);
    assert!(!params.reconnect);
}

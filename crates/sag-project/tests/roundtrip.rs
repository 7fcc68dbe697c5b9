use sag_project::*;
use sag_sim::{Parameters, SimOptions, Targets};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("sag_project_{}_{}", std::process::id(), name))
}

fn sample_scenario() -> Scenario {
    Scenario {
        version: LATEST_VERSION,
        name: "Roundtrip".to_string(),
        duration_h: 12.0,
        parameters: Parameters {
            k_discharge_per_h: 0.8,
            recirc_delay_min: 60.0,
            ..Parameters::default()
        },
        targets: Some(Targets {
            feed_flow_tph: 2100.0,
            feed_grade: 0.008,
        }),
        options: SimOptions {
            seed: Some(3),
            record_every: 5,
            ..SimOptions::default()
        },
        events: vec![
            ScenarioEvent {
                at_h: 2.0,
                action: EventAction::SetTarget {
                    kind: "F".to_string(),
                    value: 2300.0,
                },
            },
            ScenarioEvent {
                at_h: 4.0,
                action: EventAction::SetParameter {
                    name: "tau_flow_h".to_string(),
                    value: 1.0,
                },
            },
            ScenarioEvent {
                at_h: 6.0,
                action: EventAction::Reset,
            },
        ],
    }
}

#[test]
fn roundtrip_yaml_default_scenario() {
    let scenario = Scenario::default();
    let path = temp_path("default.yaml");
    save_yaml(&path, &scenario).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(scenario, loaded);
}

#[test]
fn roundtrip_yaml_with_events() {
    let scenario = sample_scenario();
    let path = temp_path("events.yaml");
    save_yaml(&path, &scenario).unwrap();
    assert_eq!(scenario, load(&path).unwrap());
}

#[test]
fn roundtrip_json_with_events() {
    let scenario = sample_scenario();
    let path = temp_path("events.json");
    save_json(&path, &scenario).unwrap();
    assert_eq!(scenario, load(&path).unwrap());
}

#[test]
fn partial_file_falls_back_to_defaults() {
    let yaml = "name: partial\nduration_h: 5.0\nparameters:\n  k_discharge_per_h: 1.5\n";
    let scenario = from_yaml_str(yaml).unwrap();
    assert_eq!(scenario.version, LATEST_VERSION);
    assert_eq!(scenario.parameters.k_discharge_per_h, 1.5);
    assert_eq!(scenario.parameters.recirc_fraction, 0.11);
    assert_eq!(scenario.options, SimOptions::default());
    assert!(scenario.targets.is_none());
    assert!(scenario.events.is_empty());
}

#[test]
fn event_yaml_layout() {
    let yaml = r#"
name: events
duration_h: 10.0
events:
  - at_h: 1.0
    action: set_target
    kind: L
    value: 0.009
  - at_h: 2.0
    action: reset
"#;
    let scenario = from_yaml_str(yaml).unwrap();
    assert_eq!(
        scenario.events[0].action,
        EventAction::SetTarget {
            kind: "L".to_string(),
            value: 0.009
        }
    );
    assert_eq!(scenario.events[1].action, EventAction::Reset);
}

#[test]
fn invalid_file_is_rejected_on_load() {
    let yaml = "name: bad\nduration_h: 5.0\nparameters:\n  k_discharge_per_h: 3.0\n";
    assert!(matches!(
        from_yaml_str(yaml),
        Err(ProjectError::Validation(_))
    ));
}

#[test]
fn invalid_scenario_is_not_saved() {
    let scenario = Scenario {
        duration_h: -1.0,
        ..Scenario::default()
    };
    let path = temp_path("invalid.yaml");
    assert!(save_yaml(&path, &scenario).is_err());
    assert!(!path.exists());
}

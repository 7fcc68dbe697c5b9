//! Scenario validation logic.

use sag_sim::{ParamName, SimError, TargetKind, Targets};

use crate::schema::{EventAction, Scenario};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid model configuration in {context}: {source}")]
    Model {
        context: String,
        #[source]
        source: SimError,
    },

    #[error("Events out of order: event {index} at {at_h} h precedes the one before it")]
    EventOrder { index: usize, at_h: f64 },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn model(context: impl Into<String>) -> impl FnOnce(SimError) -> ValidationError {
    let context = context.into();
    move |source| ValidationError::Model { context, source }
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ValidationError> {
    if scenario.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    if scenario.name.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            value: format!("{:?}", scenario.name),
            reason: "must not be empty".to_string(),
        });
    }

    if !scenario.duration_h.is_finite() || scenario.duration_h <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "duration_h".to_string(),
            value: scenario.duration_h.to_string(),
            reason: "must be positive".to_string(),
        });
    }

    scenario.parameters.validate().map_err(model("parameters"))?;
    scenario.options.validate().map_err(model("options"))?;
    scenario
        .options
        .check_delays(&scenario.parameters)
        .map_err(model("parameters"))?;

    if let Some(targets) = &scenario.targets {
        let mut checked = Targets::nominal(&scenario.parameters);
        checked
            .set(TargetKind::Flow, targets.feed_flow_tph)
            .map_err(model("targets"))?;
        checked
            .set(TargetKind::Grade, targets.feed_grade)
            .map_err(model("targets"))?;
    }

    validate_events(scenario)
}

fn validate_events(scenario: &Scenario) -> Result<(), ValidationError> {
    let mut previous = 0.0;
    for (index, event) in scenario.events.iter().enumerate() {
        let context = format!("events[{index}]");
        if !event.at_h.is_finite() || event.at_h < 0.0 || event.at_h > scenario.duration_h {
            return Err(ValidationError::InvalidValue {
                field: format!("{context}.at_h"),
                value: event.at_h.to_string(),
                reason: "must lie within the run duration".to_string(),
            });
        }
        if event.at_h < previous {
            return Err(ValidationError::EventOrder {
                index,
                at_h: event.at_h,
            });
        }
        previous = event.at_h;

        match &event.action {
            EventAction::SetTarget { kind, value } => {
                let kind: TargetKind = kind.parse().map_err(model(context.as_str()))?;
                Targets::nominal(&scenario.parameters)
                    .set(kind, *value)
                    .map_err(model(context))?;
            }
            EventAction::SetParameter { name, value } => {
                let name: ParamName = name.parse().map_err(model(context.as_str()))?;
                // Checked against the file's base parameters; a value that
                // only becomes invalid after earlier events is caught at run time.
                let mut params = scenario.parameters.clone();
                params.set(name, *value).map_err(model(context.as_str()))?;
                scenario
                    .options
                    .check_delays(&params)
                    .map_err(model(context))?;
            }
            EventAction::Reset => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScenarioEvent;

    fn event(at_h: f64, action: EventAction) -> ScenarioEvent {
        ScenarioEvent { at_h, action }
    }

    #[test]
    fn default_scenario_is_valid() {
        validate_scenario(&Scenario::default()).unwrap();
    }

    #[test]
    fn rejects_non_positive_duration() {
        let scenario = Scenario {
            duration_h: 0.0,
            ..Scenario::default()
        };
        assert!(matches!(
            validate_scenario(&scenario),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_future_version() {
        let scenario = Scenario {
            version: crate::migrate::LATEST_VERSION + 1,
            ..Scenario::default()
        };
        assert!(matches!(
            validate_scenario(&scenario),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_discharge_constant() {
        let mut scenario = Scenario::default();
        scenario.parameters.k_discharge_per_h = 5.0;
        let err = validate_scenario(&scenario).unwrap_err();
        assert!(err.to_string().contains("parameters"));
    }

    #[test]
    fn rejects_unordered_events() {
        let scenario = Scenario {
            events: vec![
                event(
                    3.0,
                    EventAction::SetTarget {
                        kind: "F".to_string(),
                        value: 2200.0,
                    },
                ),
                event(1.0, EventAction::Reset),
            ],
            ..Scenario::default()
        };
        assert!(matches!(
            validate_scenario(&scenario),
            Err(ValidationError::EventOrder { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_event_after_end() {
        let scenario = Scenario {
            events: vec![event(30.0, EventAction::Reset)],
            ..Scenario::default()
        };
        assert!(validate_scenario(&scenario).is_err());
    }

    #[test]
    fn rejects_unknown_names() {
        let scenario = Scenario {
            events: vec![event(
                1.0,
                EventAction::SetParameter {
                    name: "mill_speed".to_string(),
                    value: 1.0,
                },
            )],
            ..Scenario::default()
        };
        let err = validate_scenario(&scenario).unwrap_err();
        assert!(err.to_string().contains("events[0]"));

        let scenario = Scenario {
            events: vec![event(
                1.0,
                EventAction::SetTarget {
                    kind: "density".to_string(),
                    value: 1.0,
                },
            )],
            ..Scenario::default()
        };
        assert!(validate_scenario(&scenario).is_err());
    }

    #[test]
    fn rejects_delays_beyond_retention() {
        let mut scenario = Scenario::default();
        scenario.options.max_delay_min = 60.0;
        let err = validate_scenario(&scenario).unwrap_err();
        assert!(err.to_string().contains("recirc_delay_min"));

        let scenario = Scenario {
            events: vec![event(
                1.0,
                EventAction::SetParameter {
                    name: "fines_delay_min".to_string(),
                    value: 500.0,
                },
            )],
            ..Scenario::default()
        };
        assert!(validate_scenario(&scenario).is_err());
    }

    #[test]
    fn rejects_invalid_event_value() {
        let scenario = Scenario {
            events: vec![event(
                1.0,
                EventAction::SetParameter {
                    name: "recirc_fraction".to_string(),
                    value: 1.5,
                },
            )],
            ..Scenario::default()
        };
        assert!(validate_scenario(&scenario).is_err());
    }
}

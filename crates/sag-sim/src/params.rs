//! Operator-tunable parameters and setpoint targets.
//!
//! Units follow the field suffix: `_tph` t/h, `_h` hours, `_min` minutes,
//! `_per_h` 1/h. Moistures, grades and fractions are plain ratios.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sag_controls::VariabilityProfile;

use crate::error::{SimError, SimResult};

/// Plant nominal throughput: 45 kt/day at 94% availability.
pub const NOMINAL_FEED_FLOW_TPH: f64 = 45_000.0 / (24.0 * 0.94);
pub const NOMINAL_FEED_GRADE: f64 = 0.0072;

/// Admissible range of the discharge constant.
pub const K_DISCHARGE_MIN_PER_H: f64 = 0.1;
pub const K_DISCHARGE_MAX_PER_H: f64 = 2.0;

/// Feed variability settings shared by both feed channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedVariability {
    /// Variability is off until simulated time passes this point.
    pub warmup_h: f64,
    pub flow: VariabilityProfile,
    pub grade: VariabilityProfile,
    /// Fade variability out as the base value closes on its target.
    pub decay_near_target: bool,
    /// Relative distance to target below which the fade starts.
    pub proximity_band: f64,
}

impl Default for FeedVariability {
    fn default() -> Self {
        Self {
            warmup_h: 2.0,
            flow: VariabilityProfile::flow_default(),
            grade: VariabilityProfile::grade_default(),
            decay_near_target: false,
            proximity_band: 0.05,
        }
    }
}

impl FeedVariability {
    /// Everything off; used for deterministic runs.
    pub fn disabled() -> Self {
        Self {
            flow: VariabilityProfile::off(),
            grade: VariabilityProfile::off(),
            ..Self::default()
        }
    }

    /// Scale applied to the variability swing for a base value `base`
    /// chasing `target`. Always 1.0 unless `decay_near_target` is set.
    pub fn proximity(&self, base: f64, target: f64) -> f64 {
        if !self.decay_near_target || target.abs() <= f64::EPSILON {
            return 1.0;
        }
        ((target - base).abs() / (self.proximity_band * target.abs())).min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Flow target restored on reset.
    pub nominal_feed_flow_tph: f64,
    /// Grade target restored on reset.
    pub nominal_feed_grade: f64,
    /// Discharge rate constant; residence time is 1/k.
    pub k_discharge_per_h: f64,
    /// Share of fresh feed returning as oversize.
    pub recirc_fraction: f64,
    pub feed_moisture: f64,
    /// Mill moisture that make-up water is dosed to reach.
    pub mill_moisture: f64,
    pub recirc_moisture: f64,
    pub recirc_delay_min: f64,
    pub fines_delay_min: f64,
    pub tau_flow_h: f64,
    pub tau_grade_h: f64,
    /// Absolute mill feed capacity.
    pub max_feed_flow_tph: f64,
    pub min_grade: f64,
    pub max_grade: f64,
    pub variability: FeedVariability,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            nominal_feed_flow_tph: NOMINAL_FEED_FLOW_TPH,
            nominal_feed_grade: NOMINAL_FEED_GRADE,
            k_discharge_per_h: 1.0,
            recirc_fraction: 0.11,
            feed_moisture: 0.035,
            mill_moisture: 0.30,
            recirc_moisture: 0.08,
            recirc_delay_min: 90.0,
            fines_delay_min: 48.0,
            tau_flow_h: 0.5,
            tau_grade_h: 2.0,
            max_feed_flow_tph: 4000.0,
            min_grade: 0.003,
            max_grade: 0.015,
            variability: FeedVariability::default(),
        }
    }
}

impl Parameters {
    /// Check every field; the first violation is returned.
    pub fn validate(&self) -> SimResult<()> {
        non_negative("nominal_feed_flow_tph", self.nominal_feed_flow_tph)?;
        unit_interval("nominal_feed_grade", self.nominal_feed_grade)?;
        if !self.k_discharge_per_h.is_finite()
            || !(K_DISCHARGE_MIN_PER_H..=K_DISCHARGE_MAX_PER_H).contains(&self.k_discharge_per_h)
        {
            return Err(SimError::InvalidParameter {
                name: ParamName::KDischarge.as_str(),
                value: self.k_discharge_per_h,
                reason: "must lie in [0.1, 2.0] 1/h",
            });
        }
        below_one(ParamName::RecircFraction.as_str(), self.recirc_fraction)?;
        below_one(ParamName::FeedMoisture.as_str(), self.feed_moisture)?;
        below_one(ParamName::RecircMoisture.as_str(), self.recirc_moisture)?;
        below_one(ParamName::MillMoisture.as_str(), self.mill_moisture)?;
        if self.mill_moisture <= 0.0 {
            return Err(SimError::InvalidParameter {
                name: ParamName::MillMoisture.as_str(),
                value: self.mill_moisture,
                reason: "must be positive",
            });
        }
        non_negative(ParamName::RecircDelay.as_str(), self.recirc_delay_min)?;
        non_negative(ParamName::FinesDelay.as_str(), self.fines_delay_min)?;
        positive(ParamName::TauFlow.as_str(), self.tau_flow_h)?;
        positive(ParamName::TauGrade.as_str(), self.tau_grade_h)?;
        positive(ParamName::MaxFeedFlow.as_str(), self.max_feed_flow_tph)?;
        unit_interval(ParamName::MinGrade.as_str(), self.min_grade)?;
        unit_interval(ParamName::MaxGrade.as_str(), self.max_grade)?;
        if self.min_grade >= self.max_grade {
            return Err(SimError::InvalidParameter {
                name: ParamName::MinGrade.as_str(),
                value: self.min_grade,
                reason: "must be below max_grade",
            });
        }
        non_negative("variability.warmup_h", self.variability.warmup_h)?;
        positive("variability.proximity_band", self.variability.proximity_band)?;
        self.variability.flow.validate()?;
        self.variability.grade.validate()?;
        Ok(())
    }

    /// Update one named parameter. The change is validated on a copy and
    /// only committed if the whole set stays valid.
    pub fn set(&mut self, name: ParamName, value: f64) -> SimResult<()> {
        let mut next = self.clone();
        *next.field_mut(name) = value;
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn get(&self, name: ParamName) -> f64 {
        match name {
            ParamName::KDischarge => self.k_discharge_per_h,
            ParamName::RecircFraction => self.recirc_fraction,
            ParamName::FeedMoisture => self.feed_moisture,
            ParamName::MillMoisture => self.mill_moisture,
            ParamName::RecircMoisture => self.recirc_moisture,
            ParamName::RecircDelay => self.recirc_delay_min,
            ParamName::FinesDelay => self.fines_delay_min,
            ParamName::TauFlow => self.tau_flow_h,
            ParamName::TauGrade => self.tau_grade_h,
            ParamName::FlowVariability => self.variability.flow.amplitude,
            ParamName::GradeVariability => self.variability.grade.amplitude,
            ParamName::MaxFeedFlow => self.max_feed_flow_tph,
            ParamName::MinGrade => self.min_grade,
            ParamName::MaxGrade => self.max_grade,
        }
    }

    fn field_mut(&mut self, name: ParamName) -> &mut f64 {
        match name {
            ParamName::KDischarge => &mut self.k_discharge_per_h,
            ParamName::RecircFraction => &mut self.recirc_fraction,
            ParamName::FeedMoisture => &mut self.feed_moisture,
            ParamName::MillMoisture => &mut self.mill_moisture,
            ParamName::RecircMoisture => &mut self.recirc_moisture,
            ParamName::RecircDelay => &mut self.recirc_delay_min,
            ParamName::FinesDelay => &mut self.fines_delay_min,
            ParamName::TauFlow => &mut self.tau_flow_h,
            ParamName::TauGrade => &mut self.tau_grade_h,
            ParamName::FlowVariability => &mut self.variability.flow.amplitude,
            ParamName::GradeVariability => &mut self.variability.grade.amplitude,
            ParamName::MaxFeedFlow => &mut self.max_feed_flow_tph,
            ParamName::MinGrade => &mut self.min_grade,
            ParamName::MaxGrade => &mut self.max_grade,
        }
    }
}

/// Names of the parameters an operator may change while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamName {
    KDischarge,
    RecircFraction,
    FeedMoisture,
    MillMoisture,
    RecircMoisture,
    RecircDelay,
    FinesDelay,
    TauFlow,
    TauGrade,
    FlowVariability,
    GradeVariability,
    MaxFeedFlow,
    MinGrade,
    MaxGrade,
}

impl ParamName {
    pub const ALL: [ParamName; 14] = [
        ParamName::KDischarge,
        ParamName::RecircFraction,
        ParamName::FeedMoisture,
        ParamName::MillMoisture,
        ParamName::RecircMoisture,
        ParamName::RecircDelay,
        ParamName::FinesDelay,
        ParamName::TauFlow,
        ParamName::TauGrade,
        ParamName::FlowVariability,
        ParamName::GradeVariability,
        ParamName::MaxFeedFlow,
        ParamName::MinGrade,
        ParamName::MaxGrade,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::KDischarge => "k_discharge",
            ParamName::RecircFraction => "recirc_fraction",
            ParamName::FeedMoisture => "feed_moisture",
            ParamName::MillMoisture => "mill_moisture",
            ParamName::RecircMoisture => "recirc_moisture",
            ParamName::RecircDelay => "recirc_delay_min",
            ParamName::FinesDelay => "fines_delay_min",
            ParamName::TauFlow => "tau_flow_h",
            ParamName::TauGrade => "tau_grade_h",
            ParamName::FlowVariability => "flow_variability",
            ParamName::GradeVariability => "grade_variability",
            ParamName::MaxFeedFlow => "max_feed_flow_tph",
            ParamName::MinGrade => "min_grade",
            ParamName::MaxGrade => "max_grade",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamName::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| SimError::UnknownParameter {
                name: s.to_string(),
            })
    }
}

/// Operator setpoints chased by the feed generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub feed_flow_tph: f64,
    pub feed_grade: f64,
}

impl Targets {
    pub fn nominal(params: &Parameters) -> Self {
        Self {
            feed_flow_tph: params.nominal_feed_flow_tph,
            feed_grade: params.nominal_feed_grade,
        }
    }

    pub fn get(&self, kind: TargetKind) -> f64 {
        match kind {
            TargetKind::Flow => self.feed_flow_tph,
            TargetKind::Grade => self.feed_grade,
        }
    }

    /// Validate and store one setpoint.
    pub fn set(&mut self, kind: TargetKind, value: f64) -> SimResult<()> {
        if !value.is_finite() {
            return Err(SimError::InvalidTarget {
                kind: kind.as_str(),
                value,
                reason: "must be finite",
            });
        }
        match kind {
            TargetKind::Flow => {
                if value < 0.0 {
                    return Err(SimError::InvalidTarget {
                        kind: kind.as_str(),
                        value,
                        reason: "must be non-negative",
                    });
                }
                self.feed_flow_tph = value;
            }
            TargetKind::Grade => {
                if !(0.0..=1.0).contains(&value) {
                    return Err(SimError::InvalidTarget {
                        kind: kind.as_str(),
                        value,
                        reason: "must be a mass fraction in [0, 1]",
                    });
                }
                self.feed_grade = value;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Flow,
    Grade,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Flow => "flow",
            TargetKind::Grade => "grade",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = SimError;

    /// Accepts the long names and the plant shorthands (`F` flow, `L` ley/grade).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flow" | "feed_flow" | "F" => Ok(TargetKind::Flow),
            "grade" | "feed_grade" | "L" => Ok(TargetKind::Grade),
            other => Err(SimError::UnknownTarget {
                kind: other.to_string(),
            }),
        }
    }
}

fn positive(name: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter {
            name,
            value,
            reason: "must be finite and positive",
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter {
            name,
            value,
            reason: "must be finite and non-negative",
        })
    }
}

fn unit_interval(name: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidParameter {
            name,
            value,
            reason: "must lie in [0, 1]",
        })
    }
}

fn below_one(name: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidParameter {
            name,
            value,
            reason: "must lie in [0, 1)",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let p = Parameters::default();
        p.validate().unwrap();
        assert!((p.nominal_feed_flow_tph - 1994.68).abs() < 0.01);
    }

    #[test]
    fn k_outside_bounds_is_rejected() {
        for k in [0.0, -1.0, 0.05, 2.5, f64::NAN] {
            let p = Parameters {
                k_discharge_per_h: k,
                ..Parameters::default()
            };
            assert!(matches!(
                p.validate(),
                Err(SimError::InvalidParameter {
                    name: "k_discharge",
                    ..
                })
            ));
        }
    }

    #[test]
    fn set_is_atomic() {
        let mut p = Parameters::default();
        let err = p.set(ParamName::TauFlow, 0.0).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { name: "tau_flow_h", .. }));
        assert_eq!(p.tau_flow_h, 0.5);

        p.set(ParamName::RecircDelay, 30.0).unwrap();
        assert_eq!(p.get(ParamName::RecircDelay), 30.0);
    }

    #[test]
    fn negative_delay_is_rejected() {
        let mut p = Parameters::default();
        assert!(p.set(ParamName::FinesDelay, -5.0).is_err());
    }

    #[test]
    fn grade_bounds_must_be_ordered() {
        let mut p = Parameters::default();
        assert!(p.set(ParamName::MinGrade, 0.02).is_err());
        assert!(p.set(ParamName::MaxGrade, 0.002).is_err());
    }

    #[test]
    fn variability_amplitude_is_settable() {
        let mut p = Parameters::default();
        p.set(ParamName::FlowVariability, 0.02).unwrap();
        assert_eq!(p.variability.flow.amplitude, 0.02);
        assert!(p.set(ParamName::GradeVariability, 0.9).is_err());
    }

    #[test]
    fn param_names_round_trip() {
        for name in ParamName::ALL {
            assert_eq!(name.as_str().parse::<ParamName>().unwrap(), name);
        }
        assert!(matches!(
            "humedad".parse::<ParamName>(),
            Err(SimError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn target_kinds_parse_shorthands() {
        assert_eq!("F".parse::<TargetKind>().unwrap(), TargetKind::Flow);
        assert_eq!("L".parse::<TargetKind>().unwrap(), TargetKind::Grade);
        assert_eq!("grade".parse::<TargetKind>().unwrap(), TargetKind::Grade);
        assert!(matches!(
            "moisture".parse::<TargetKind>(),
            Err(SimError::UnknownTarget { .. })
        ));
    }

    #[test]
    fn targets_reject_bad_values() {
        let mut t = Targets::nominal(&Parameters::default());
        assert!(t.set(TargetKind::Flow, -1.0).is_err());
        assert!(t.set(TargetKind::Grade, 1.5).is_err());
        assert!(t.set(TargetKind::Flow, f64::NAN).is_err());
        t.set(TargetKind::Flow, 2500.0).unwrap();
        assert_eq!(t.get(TargetKind::Flow), 2500.0);
    }

    #[test]
    fn proximity_only_when_enabled() {
        let mut v = FeedVariability::default();
        assert_eq!(v.proximity(1990.0, 2000.0), 1.0);
        v.decay_near_target = true;
        assert!((v.proximity(1990.0, 2000.0) - 0.1).abs() < 1e-12);
        assert_eq!(v.proximity(1000.0, 2000.0), 1.0);
        assert_eq!(v.proximity(2000.0, 2000.0), 0.0);
    }
}

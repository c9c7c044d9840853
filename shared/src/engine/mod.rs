//! Condition engine
//!
//! Maps a fused sensor snapshot and a threshold set to a WMO present-weather
//! code. The engine is a pure function: no I/O, no clock, no shared state.
//! Insufficient input yields an indeterminate condition, never an error.
//!
//! Evaluation walks [`RULES`] in order and the first rule that produces a
//! code wins, so priority between conditions is data rather than nested
//! control flow.

mod precipitation;
mod rules;

pub use precipitation::{PrecipitationZone, PRECIPITATION_ZONES};
pub use rules::{Rule, RULES};

use serde::Serialize;

use crate::models::{DerivedCondition, SensorSnapshot};
use crate::thresholds::ThresholdSet;

/// The subset of a snapshot the rules look at, with derived quantities
/// computed once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub temperature_c: f64,
    pub humidity_pct: Option<f64>,
    pub dewpoint_c: Option<f64>,
    /// Ambient minus dewpoint
    pub spread: Option<f64>,
    /// Ambient minus sky temperature, rounded to 0.1 °C
    pub delta: Option<f64>,
    /// Missing rate reads as zero
    pub precip_rate_mm: f64,
    pub wind_speed_ms: Option<f64>,
    /// Rain flag of the sky sensor
    pub rain_detected: bool,
}

impl Observation {
    /// `None` when the snapshot has no usable temperature
    pub fn from_snapshot(snapshot: &SensorSnapshot) -> Option<Self> {
        let temperature_c = snapshot.temperature_c.filter(|t| t.is_finite())?;
        Some(Self {
            temperature_c,
            humidity_pct: snapshot.humidity_pct,
            dewpoint_c: snapshot.dewpoint_c,
            spread: snapshot.spread(),
            delta: snapshot.delta(),
            precip_rate_mm: snapshot.precip_rate_mm.unwrap_or(0.0),
            wind_speed_ms: snapshot.wind_speed_ms,
            rain_detected: snapshot.is_raining.unwrap_or(false),
        })
    }

    pub fn is_precipitating(&self) -> bool {
        self.precip_rate_mm > 0.0 || self.rain_detected
    }
}

/// A derived condition together with the rule that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub condition: DerivedCondition,
    pub matched_rule: Option<&'static str>,
}

/// Derive the present-weather condition for a snapshot.
pub fn derive(snapshot: &SensorSnapshot, thresholds: &ThresholdSet) -> DerivedCondition {
    evaluate(snapshot, thresholds).condition
}

/// Like [`derive`], but also reports which rule matched.
pub fn evaluate(snapshot: &SensorSnapshot, thresholds: &ThresholdSet) -> Evaluation {
    let delta = snapshot.delta();

    let Some(observation) = Observation::from_snapshot(snapshot) else {
        return Evaluation {
            condition: DerivedCondition::indeterminate(delta),
            matched_rule: None,
        };
    };

    RULES
        .iter()
        .find_map(|rule| {
            (rule.evaluate)(&observation, thresholds).map(|code| Evaluation {
                condition: DerivedCondition::classified(code, delta),
                matched_rule: Some(rule.name),
            })
        })
        .unwrap_or(Evaluation {
            condition: DerivedCondition::indeterminate(delta),
            matched_rule: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WmoCode;

    #[test]
    fn test_missing_temperature_is_indeterminate() {
        let snapshot = SensorSnapshot {
            humidity_pct: Some(99.0),
            precip_rate_mm: Some(5.0),
            ..Default::default()
        };
        let result = derive(&snapshot, &ThresholdSet::default());
        assert!(result.is_indeterminate());
        assert!(result.delta.is_none());
    }

    #[test]
    fn test_non_finite_temperature_is_indeterminate() {
        let snapshot = SensorSnapshot {
            temperature_c: Some(f64::NAN),
            sky_temperature_c: Some(-20.0),
            ..Default::default()
        };
        assert!(derive(&snapshot, &ThresholdSet::default()).is_indeterminate());
    }

    #[test]
    fn test_cloud_cover_requires_delta() {
        let snapshot = SensorSnapshot {
            temperature_c: Some(14.0),
            humidity_pct: Some(70.0),
            dewpoint_c: Some(8.6),
            precip_rate_mm: Some(0.0),
            ..Default::default()
        };
        let evaluation = evaluate(&snapshot, &ThresholdSet::default());
        assert!(evaluation.condition.is_indeterminate());
        assert!(evaluation.matched_rule.is_none());
    }

    #[test]
    fn test_evaluation_names_matching_rule() {
        let snapshot = SensorSnapshot {
            temperature_c: Some(10.0),
            sky_temperature_c: Some(-20.0),
            ..Default::default()
        };
        let evaluation = evaluate(&snapshot, &ThresholdSet::default());
        assert_eq!(evaluation.condition.code, Some(WmoCode::Clear));
        assert_eq!(evaluation.condition.delta, Some(30.0));
        assert_eq!(evaluation.matched_rule, Some("cloud_cover"));
    }

    #[test]
    fn test_rain_flag_alone_triggers_precipitation() {
        let snapshot = SensorSnapshot {
            temperature_c: Some(8.0),
            is_raining: Some(true),
            ..Default::default()
        };
        let result = derive(&snapshot, &ThresholdSet::default());
        assert_eq!(result.code, Some(WmoCode::DrizzleLight));
    }
}

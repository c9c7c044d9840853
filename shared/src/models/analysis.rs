//! Derived analysis results: error patterns and threshold recommendations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SensorSnapshot, WmoCode};
use crate::psychrometrics::dewpoint_magnus;
use crate::thresholds::{ThresholdChange, ThresholdParam};

/// Readings labelled wrong, grouped by what the engine said and what the
/// human said instead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPattern {
    /// `None` groups readings the engine could not classify
    pub observed_code: Option<WmoCode>,
    pub corrected_code: WmoCode,
    pub count: usize,
    pub mean_temperature: Option<f64>,
    pub mean_humidity: Option<f64>,
    pub mean_delta: Option<f64>,
    pub mean_precip_rate: Option<f64>,
    /// Mean of ambient minus dewpoint
    #[serde(default)]
    pub mean_spread: Option<f64>,
    #[serde(default)]
    pub mean_wind_speed: Option<f64>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl ErrorPattern {
    pub fn mean(&self, metric: PatternMetric) -> Option<f64> {
        match metric {
            PatternMetric::Temperature => self.mean_temperature,
            PatternMetric::Humidity => self.mean_humidity,
            PatternMetric::Delta => self.mean_delta,
            PatternMetric::PrecipRate => self.mean_precip_rate,
        }
    }

    /// A snapshot standing in for the pattern's readings, built from its
    /// means. `None` without a mean temperature.
    ///
    /// The dewpoint comes from the mean spread when known, otherwise from
    /// temperature and humidity.
    pub fn representative_snapshot(&self) -> Option<SensorSnapshot> {
        let temperature = self.mean_temperature?;
        let dewpoint = self.mean_spread.map(|spread| temperature - spread).or_else(|| {
            self.mean_humidity
                .and_then(|humidity| dewpoint_magnus(temperature, humidity))
        });

        Some(SensorSnapshot {
            temperature_c: Some(temperature),
            humidity_pct: self.mean_humidity,
            dewpoint_c: dewpoint,
            wind_speed_ms: self.mean_wind_speed,
            precip_rate_mm: self.mean_precip_rate,
            sky_temperature_c: self.mean_delta.map(|delta| temperature - delta),
            ..Default::default()
        })
    }
}

/// Which pattern mean a threshold boundary is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternMetric {
    Temperature,
    Humidity,
    Delta,
    PrecipRate,
}

impl PatternMetric {
    /// Distance a suggested boundary is placed beyond the pattern mean
    pub fn safety_margin(self) -> f64 {
        match self {
            PatternMetric::Temperature => 0.5,
            PatternMetric::Humidity => 1.0,
            PatternMetric::Delta => 1.0,
            PatternMetric::PrecipRate => 0.1,
        }
    }
}

/// A proposed threshold change awaiting operator approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub parameter_name: ThresholdParam,
    pub current_value: f64,
    pub suggested_value: f64,
    pub metric: PatternMetric,
    /// Parameters sharing the boundary, moved to the same value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_changes: Vec<LinkedChange>,
    pub supporting_pattern: ErrorPattern,
    pub evidence_count: usize,
}

impl Recommendation {
    /// Every change to approve together, primary parameter first
    pub fn changes(&self) -> Vec<ThresholdChange> {
        std::iter::once((self.parameter_name, self.suggested_value))
            .chain(
                self.linked_changes
                    .iter()
                    .map(|c| (c.parameter_name, c.suggested_value)),
            )
            .map(|(parameter, value)| ThresholdChange {
                parameter: parameter.to_string(),
                value,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedChange {
    pub parameter_name: ThresholdParam,
    pub current_value: f64,
    pub suggested_value: f64,
}

//! Threshold vocabulary and threshold sets
//!
//! The parameter names form a fixed, versioned vocabulary shared by the
//! condition engine, the recommendation engine and the threshold store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bump when parameters are added, removed or renamed
pub const THRESHOLD_VOCABULARY_VERSION: u32 = 1;

/// A tunable numeric boundary of the condition engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdParam {
    // Cloud cover bands (delta, °C)
    CloudClearDelta,
    CloudMainlyClearDelta,
    CloudPartlyCloudyDelta,
    // Precipitation rate bands (mm/h)
    DrizzleLightMaxRate,
    DrizzleMaxRate,
    FreezingDrizzleDenseRate,
    RainLightMaxRate,
    RainModerateMaxRate,
    // Fog / mist / haze bands
    FogSpreadMax,
    FogHumidityMin,
    FogDeltaMax,
    FogSpreadVeto,
    MistSpreadMax,
    MistHumidityMin,
    MistHumidityMax,
    ShallowFogWindMax,
    ShallowFogHumidityMin,
    HazeHumidityMax,
    HazeDeltaMin,
    // Temperature zones (°C)
    SnowTempMax,
    SnowCertainTemp,
    SleetTempMin,
    SleetTempMax,
    FreezingTempMax,
    FreezingRainTemp,
    SnowGrainsTemp,
}

impl ThresholdParam {
    pub const ALL: [ThresholdParam; 26] = [
        ThresholdParam::CloudClearDelta,
        ThresholdParam::CloudMainlyClearDelta,
        ThresholdParam::CloudPartlyCloudyDelta,
        ThresholdParam::DrizzleLightMaxRate,
        ThresholdParam::DrizzleMaxRate,
        ThresholdParam::FreezingDrizzleDenseRate,
        ThresholdParam::RainLightMaxRate,
        ThresholdParam::RainModerateMaxRate,
        ThresholdParam::FogSpreadMax,
        ThresholdParam::FogHumidityMin,
        ThresholdParam::FogDeltaMax,
        ThresholdParam::FogSpreadVeto,
        ThresholdParam::MistSpreadMax,
        ThresholdParam::MistHumidityMin,
        ThresholdParam::MistHumidityMax,
        ThresholdParam::ShallowFogWindMax,
        ThresholdParam::ShallowFogHumidityMin,
        ThresholdParam::HazeHumidityMax,
        ThresholdParam::HazeDeltaMin,
        ThresholdParam::SnowTempMax,
        ThresholdParam::SnowCertainTemp,
        ThresholdParam::SleetTempMin,
        ThresholdParam::SleetTempMax,
        ThresholdParam::FreezingTempMax,
        ThresholdParam::FreezingRainTemp,
        ThresholdParam::SnowGrainsTemp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ThresholdParam::CloudClearDelta => "cloud_clear_delta",
            ThresholdParam::CloudMainlyClearDelta => "cloud_mainly_clear_delta",
            ThresholdParam::CloudPartlyCloudyDelta => "cloud_partly_cloudy_delta",
            ThresholdParam::DrizzleLightMaxRate => "drizzle_light_max_rate",
            ThresholdParam::DrizzleMaxRate => "drizzle_max_rate",
            ThresholdParam::FreezingDrizzleDenseRate => "freezing_drizzle_dense_rate",
            ThresholdParam::RainLightMaxRate => "rain_light_max_rate",
            ThresholdParam::RainModerateMaxRate => "rain_moderate_max_rate",
            ThresholdParam::FogSpreadMax => "fog_spread_max",
            ThresholdParam::FogHumidityMin => "fog_humidity_min",
            ThresholdParam::FogDeltaMax => "fog_delta_max",
            ThresholdParam::FogSpreadVeto => "fog_spread_veto",
            ThresholdParam::MistSpreadMax => "mist_spread_max",
            ThresholdParam::MistHumidityMin => "mist_humidity_min",
            ThresholdParam::MistHumidityMax => "mist_humidity_max",
            ThresholdParam::ShallowFogWindMax => "shallow_fog_wind_max",
            ThresholdParam::ShallowFogHumidityMin => "shallow_fog_humidity_min",
            ThresholdParam::HazeHumidityMax => "haze_humidity_max",
            ThresholdParam::HazeDeltaMin => "haze_delta_min",
            ThresholdParam::SnowTempMax => "snow_temp_max",
            ThresholdParam::SnowCertainTemp => "snow_certain_temp",
            ThresholdParam::SleetTempMin => "sleet_temp_min",
            ThresholdParam::SleetTempMax => "sleet_temp_max",
            ThresholdParam::FreezingTempMax => "freezing_temp_max",
            ThresholdParam::FreezingRainTemp => "freezing_rain_temp",
            ThresholdParam::SnowGrainsTemp => "snow_grains_temp",
        }
    }

    /// Value used when no override has been applied
    pub fn default_value(self) -> f64 {
        match self {
            ThresholdParam::CloudClearDelta => 25.0,
            ThresholdParam::CloudMainlyClearDelta => 18.0,
            ThresholdParam::CloudPartlyCloudyDelta => 8.0,
            ThresholdParam::DrizzleLightMaxRate => 0.2,
            ThresholdParam::DrizzleMaxRate => 1.0,
            ThresholdParam::FreezingDrizzleDenseRate => 0.5,
            ThresholdParam::RainLightMaxRate => 2.5,
            ThresholdParam::RainModerateMaxRate => 7.5,
            ThresholdParam::FogSpreadMax => 1.0,
            ThresholdParam::FogHumidityMin => 97.0,
            ThresholdParam::FogDeltaMax => 5.0,
            ThresholdParam::FogSpreadVeto => 3.0,
            ThresholdParam::MistSpreadMax => 2.0,
            ThresholdParam::MistHumidityMin => 90.0,
            ThresholdParam::MistHumidityMax => 97.0,
            ThresholdParam::ShallowFogWindMax => 1.0,
            ThresholdParam::ShallowFogHumidityMin => 95.0,
            ThresholdParam::HazeHumidityMax => 60.0,
            ThresholdParam::HazeDeltaMin => 15.0,
            ThresholdParam::SnowTempMax => 1.5,
            ThresholdParam::SnowCertainTemp => -2.0,
            ThresholdParam::SleetTempMin => 1.5,
            ThresholdParam::SleetTempMax => 3.0,
            ThresholdParam::FreezingTempMax => 0.5,
            ThresholdParam::FreezingRainTemp => -1.0,
            ThresholdParam::SnowGrainsTemp => -2.0,
        }
    }

    /// Inclusive range a value must fall in to be accepted
    pub fn valid_range(self) -> (f64, f64) {
        match self {
            ThresholdParam::CloudClearDelta
            | ThresholdParam::CloudMainlyClearDelta
            | ThresholdParam::CloudPartlyCloudyDelta
            | ThresholdParam::HazeDeltaMin => (0.0, 50.0),
            ThresholdParam::DrizzleLightMaxRate | ThresholdParam::FreezingDrizzleDenseRate => {
                (0.0, 5.0)
            }
            ThresholdParam::DrizzleMaxRate => (0.0, 10.0),
            ThresholdParam::RainLightMaxRate => (0.0, 20.0),
            ThresholdParam::RainModerateMaxRate => (0.0, 50.0),
            ThresholdParam::FogSpreadMax
            | ThresholdParam::MistSpreadMax
            | ThresholdParam::ShallowFogWindMax => (0.0, 5.0),
            ThresholdParam::FogDeltaMax => (0.0, 30.0),
            ThresholdParam::FogSpreadVeto => (0.0, 10.0),
            ThresholdParam::FogHumidityMin
            | ThresholdParam::MistHumidityMin
            | ThresholdParam::MistHumidityMax
            | ThresholdParam::ShallowFogHumidityMin => (50.0, 100.0),
            ThresholdParam::HazeHumidityMax => (0.0, 100.0),
            ThresholdParam::SnowTempMax | ThresholdParam::SleetTempMin => (-5.0, 5.0),
            ThresholdParam::SnowCertainTemp => (-10.0, 0.0),
            ThresholdParam::SleetTempMax => (0.0, 8.0),
            ThresholdParam::FreezingTempMax => (0.0, 3.0),
            ThresholdParam::FreezingRainTemp => (-5.0, 0.0),
            ThresholdParam::SnowGrainsTemp => (-15.0, 0.0),
        }
    }

    /// Resolution suggested values are rounded to
    pub fn step(self) -> f64 {
        match self {
            ThresholdParam::DrizzleLightMaxRate
            | ThresholdParam::DrizzleMaxRate
            | ThresholdParam::FreezingDrizzleDenseRate
            | ThresholdParam::RainLightMaxRate
            | ThresholdParam::RainModerateMaxRate => 0.01,
            _ => 0.1,
        }
    }
}

impl fmt::Display for ThresholdParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ThresholdParam {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThresholdParam::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| ThresholdError::UnknownParameter(s.to_string()))
    }
}

/// Reasons a threshold value or set is not acceptable
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ThresholdError {
    #[error("unknown threshold parameter '{0}'")]
    UnknownParameter(String),

    #[error("{parameter} must be a finite number")]
    NotFinite { parameter: ThresholdParam },

    #[error("{parameter} = {value} is outside the valid range {min}..={max}")]
    OutOfRange {
        parameter: ThresholdParam,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("ordering violated: {0}")]
    Ordering(String),
}

/// A complete mapping from every parameter to its live value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct ThresholdSet {
    values: BTreeMap<ThresholdParam, f64>,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            values: ThresholdParam::ALL
                .iter()
                .map(|p| (*p, p.default_value()))
                .collect(),
        }
    }
}

impl ThresholdSet {
    pub fn get(&self, param: ThresholdParam) -> f64 {
        self.values
            .get(&param)
            .copied()
            .unwrap_or_else(|| param.default_value())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ThresholdParam, f64)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }

    /// Return a copy with one value replaced, after checking it in isolation
    /// and against the ordering invariants of the whole set.
    pub fn with_value(&self, param: ThresholdParam, value: f64) -> Result<Self, ThresholdError> {
        validate_value(param, value)?;
        let mut next = self.clone();
        next.values.insert(param, value);
        next.check_ordering()?;
        Ok(next)
    }

    /// Apply a batch of requested changes in order.
    ///
    /// Each change is validated against the set with all earlier accepted
    /// changes already in place; a rejected change never aborts its siblings.
    pub fn apply_changes(&self, changes: &[ThresholdChange]) -> ChangeOutcome {
        let mut set = self.clone();
        let mut applied = Vec::new();
        let mut rejected = Vec::new();

        for change in changes {
            let outcome = change
                .parameter
                .parse::<ThresholdParam>()
                .and_then(|param| set.with_value(param, change.value).map(|next| (param, next)));

            match outcome {
                Ok((param, next)) => {
                    applied.push(AppliedChange {
                        parameter: param,
                        previous: set.get(param),
                        value: change.value,
                    });
                    set = next;
                }
                Err(err) => rejected.push(RejectedChange {
                    parameter: change.parameter.clone(),
                    value: change.value,
                    reason: err.to_string(),
                }),
            }
        }

        ChangeOutcome {
            thresholds: set,
            applied,
            rejected,
        }
    }

    /// Check the cross-parameter invariants the engine's zone table relies on
    pub fn check_ordering(&self) -> Result<(), ThresholdError> {
        use ThresholdParam::*;

        let strictly_descending = [CloudClearDelta, CloudMainlyClearDelta, CloudPartlyCloudyDelta];
        for pair in strictly_descending.windows(2) {
            if self.get(pair[0]) <= self.get(pair[1]) {
                return Err(ordering(pair[0], ">", pair[1]));
            }
        }

        let strictly_ascending = [
            DrizzleLightMaxRate,
            DrizzleMaxRate,
            RainLightMaxRate,
            RainModerateMaxRate,
        ];
        for pair in strictly_ascending.windows(2) {
            if self.get(pair[0]) >= self.get(pair[1]) {
                return Err(ordering(pair[0], "<", pair[1]));
            }
        }

        let below: [(ThresholdParam, ThresholdParam); 3] = [
            (FreezingDrizzleDenseRate, DrizzleMaxRate),
            (SleetTempMin, SleetTempMax),
            (SnowCertainTemp, SnowTempMax),
        ];
        for (low, high) in below {
            if self.get(low) >= self.get(high) {
                return Err(ordering(low, "<", high));
            }
        }

        let at_most: [(ThresholdParam, ThresholdParam); 4] = [
            (FogSpreadMax, FogSpreadVeto),
            (MistHumidityMin, MistHumidityMax),
            (FreezingTempMax, SnowTempMax),
            (SnowCertainTemp, FreezingRainTemp),
        ];
        for (low, high) in at_most {
            if self.get(low) > self.get(high) {
                return Err(ordering(low, "<=", high));
            }
        }

        if self.get(SnowCertainTemp) >= 0.0 {
            return Err(ThresholdError::Ordering(format!("{} < 0", SnowCertainTemp)));
        }

        Ok(())
    }
}

fn ordering(a: ThresholdParam, op: &str, b: ThresholdParam) -> ThresholdError {
    ThresholdError::Ordering(format!("{} {} {}", a, op, b))
}

/// Validate a single value against its parameter's range
pub fn validate_value(param: ThresholdParam, value: f64) -> Result<(), ThresholdError> {
    if !value.is_finite() {
        return Err(ThresholdError::NotFinite { parameter: param });
    }
    let (min, max) = param.valid_range();
    if value < min || value > max {
        return Err(ThresholdError::OutOfRange {
            parameter: param,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl TryFrom<BTreeMap<String, f64>> for ThresholdSet {
    type Error = ThresholdError;

    /// Missing parameters take their defaults; unknown names are an error.
    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut set = ThresholdSet::default();
        for (name, value) in raw {
            let param: ThresholdParam = name.parse()?;
            validate_value(param, value)?;
            set.values.insert(param, value);
        }
        set.check_ordering()?;
        Ok(set)
    }
}

impl From<ThresholdSet> for BTreeMap<String, f64> {
    fn from(set: ThresholdSet) -> Self {
        set.values
            .into_iter()
            .map(|(p, v)| (p.name().to_string(), v))
            .collect()
    }
}

/// One requested parameter change, as submitted by an operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdChange {
    pub parameter: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedChange {
    pub parameter: ThresholdParam,
    pub previous: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedChange {
    pub parameter: String,
    pub value: f64,
    pub reason: String,
}

/// Result of validating a batch against a set, before anything is persisted
#[derive(Debug, Clone)]
pub struct ChangeOutcome {
    pub thresholds: ThresholdSet,
    pub applied: Vec<AppliedChange>,
    pub rejected: Vec<RejectedChange>,
}

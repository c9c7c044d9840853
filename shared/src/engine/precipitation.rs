//! Precipitation classification by temperature zone
//!
//! Zones are checked top to bottom; each owns a rate-based intensity split.

use super::Observation;
use crate::models::WmoCode;
use crate::thresholds::{ThresholdParam as P, ThresholdSet};

/// A temperature band with its own intensity sub-classification
pub struct PrecipitationZone {
    pub name: &'static str,
    pub contains: fn(f64, &ThresholdSet) -> bool,
    pub classify: fn(&Observation, &ThresholdSet) -> WmoCode,
}

pub static PRECIPITATION_ZONES: &[PrecipitationZone] = &[
    PrecipitationZone {
        name: "certain_snow",
        contains: |temp, t| temp < t.get(P::SnowCertainTemp),
        classify: snow,
    },
    PrecipitationZone {
        name: "snow_or_freezing_rain",
        contains: |temp, _| temp < 0.0,
        classify: snow_unless_freezing_rain,
    },
    PrecipitationZone {
        name: "freezing",
        contains: |temp, t| temp < t.get(P::FreezingTempMax),
        classify: freezing_drizzle_or_rain,
    },
    PrecipitationZone {
        name: "snow",
        contains: |temp, t| temp < t.get(P::SnowTempMax),
        classify: snow,
    },
    PrecipitationZone {
        name: "sleet",
        contains: |temp, t| temp >= t.get(P::SleetTempMin) && temp < t.get(P::SleetTempMax),
        classify: sleet,
    },
    PrecipitationZone {
        name: "rain",
        contains: |_, _| true,
        classify: rain_or_drizzle,
    },
];

/// Classify falling precipitation; callers have already established that
/// something is falling.
pub(super) fn classify(obs: &Observation, t: &ThresholdSet) -> WmoCode {
    PRECIPITATION_ZONES
        .iter()
        .find(|zone| (zone.contains)(obs.temperature_c, t))
        .map(|zone| (zone.classify)(obs, t))
        .unwrap_or_else(|| rain_or_drizzle(obs, t))
}

fn snow(obs: &Observation, t: &ThresholdSet) -> WmoCode {
    let rate = obs.precip_rate_mm;
    if rate < t.get(P::DrizzleLightMaxRate) && obs.temperature_c < t.get(P::SnowGrainsTemp) {
        WmoCode::SnowGrains
    } else if rate < t.get(P::RainLightMaxRate) {
        WmoCode::SnowSlight
    } else if rate < t.get(P::RainModerateMaxRate) {
        WmoCode::SnowModerate
    } else {
        WmoCode::SnowHeavy
    }
}

/// High rates just below freezing are freezing rain rather than snow, but
/// only above the freezing-rain floor.
fn snow_unless_freezing_rain(obs: &Observation, t: &ThresholdSet) -> WmoCode {
    if obs.precip_rate_mm >= t.get(P::RainLightMaxRate)
        && obs.temperature_c > t.get(P::FreezingRainTemp)
    {
        freezing_rain(obs, t)
    } else {
        snow(obs, t)
    }
}

fn freezing_rain(obs: &Observation, t: &ThresholdSet) -> WmoCode {
    if obs.precip_rate_mm >= t.get(P::RainLightMaxRate) {
        WmoCode::FreezingRainHeavy
    } else {
        WmoCode::FreezingRainLight
    }
}

fn freezing_drizzle_or_rain(obs: &Observation, t: &ThresholdSet) -> WmoCode {
    if obs.precip_rate_mm >= t.get(P::DrizzleMaxRate) {
        freezing_rain(obs, t)
    } else if obs.precip_rate_mm >= t.get(P::FreezingDrizzleDenseRate) {
        WmoCode::FreezingDrizzleDense
    } else {
        WmoCode::FreezingDrizzleLight
    }
}

fn sleet(obs: &Observation, t: &ThresholdSet) -> WmoCode {
    if obs.precip_rate_mm < t.get(P::RainLightMaxRate) {
        WmoCode::SleetLight
    } else {
        WmoCode::SleetHeavy
    }
}

fn rain_or_drizzle(obs: &Observation, t: &ThresholdSet) -> WmoCode {
    let rate = obs.precip_rate_mm;

    // The rate gauge under-reports at very low intensities; trust the rain flag.
    if obs.rain_detected && rate < t.get(P::DrizzleLightMaxRate) {
        return WmoCode::DrizzleLight;
    }

    if rate < t.get(P::DrizzleLightMaxRate) {
        WmoCode::DrizzleLight
    } else if rate < t.get(P::DrizzleMaxRate) {
        WmoCode::DrizzleModerate
    } else if rate < t.get(P::RainLightMaxRate) {
        WmoCode::RainSlight
    } else if rate < t.get(P::RainModerateMaxRate) {
        WmoCode::RainModerate
    } else {
        WmoCode::RainHeavy
    }
}

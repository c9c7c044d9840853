//! The ordered rule table

use super::{precipitation, Observation};
use crate::models::WmoCode;
use crate::thresholds::{ThresholdParam as P, ThresholdSet};

/// One predicate → result entry of the decision table
pub struct Rule {
    pub name: &'static str,
    pub evaluate: fn(&Observation, &ThresholdSet) -> Option<WmoCode>,
}

/// Rules in priority order; the first one returning a code wins.
///
/// Shallow fog sits before generic fog: a temperature at or below the
/// dewpoint also satisfies the fog spread bound, and the narrower condition
/// must take the tie.
pub static RULES: &[Rule] = &[
    Rule {
        name: "precipitation",
        evaluate: precipitation,
    },
    Rule {
        name: "depositing_rime_fog",
        evaluate: depositing_rime_fog,
    },
    Rule {
        name: "shallow_fog",
        evaluate: shallow_fog,
    },
    Rule {
        name: "fog",
        evaluate: fog,
    },
    Rule {
        name: "mist",
        evaluate: mist,
    },
    Rule {
        name: "haze",
        evaluate: haze,
    },
    Rule {
        name: "cloud_cover",
        evaluate: cloud_cover,
    },
];

fn precipitation(obs: &Observation, t: &ThresholdSet) -> Option<WmoCode> {
    obs.is_precipitating()
        .then(|| precipitation::classify(obs, t))
}

/// Humidity and spread known, and spread not beyond the veto.
fn fog_possible(obs: &Observation, t: &ThresholdSet) -> Option<(f64, f64)> {
    let humidity = obs.humidity_pct?;
    let spread = obs.spread?;
    (spread <= t.get(P::FogSpreadVeto)).then_some((humidity, spread))
}

fn meets_fog_bounds(obs: &Observation, t: &ThresholdSet) -> bool {
    let Some((humidity, spread)) = fog_possible(obs, t) else {
        return false;
    };
    spread < t.get(P::FogSpreadMax)
        && humidity > t.get(P::FogHumidityMin)
        && obs.delta.is_some_and(|d| d < t.get(P::FogDeltaMax))
}

fn depositing_rime_fog(obs: &Observation, t: &ThresholdSet) -> Option<WmoCode> {
    (meets_fog_bounds(obs, t) && obs.temperature_c < 0.0).then_some(WmoCode::DepositingRimeFog)
}

fn shallow_fog(obs: &Observation, t: &ThresholdSet) -> Option<WmoCode> {
    let (humidity, _) = fog_possible(obs, t)?;
    let dewpoint = obs.dewpoint_c?;
    let wind = obs.wind_speed_ms?;

    (obs.temperature_c <= dewpoint
        && wind < t.get(P::ShallowFogWindMax)
        && humidity > t.get(P::ShallowFogHumidityMin))
    .then_some(WmoCode::ShallowFog)
}

fn fog(obs: &Observation, t: &ThresholdSet) -> Option<WmoCode> {
    meets_fog_bounds(obs, t).then_some(WmoCode::Fog)
}

fn mist(obs: &Observation, t: &ThresholdSet) -> Option<WmoCode> {
    let (humidity, spread) = fog_possible(obs, t)?;
    (spread < t.get(P::MistSpreadMax)
        && humidity >= t.get(P::MistHumidityMin)
        && humidity <= t.get(P::MistHumidityMax))
    .then_some(WmoCode::Mist)
}

fn haze(obs: &Observation, t: &ThresholdSet) -> Option<WmoCode> {
    let humidity = obs.humidity_pct?;
    let delta = obs.delta?;
    (humidity < t.get(P::HazeHumidityMax) && delta > t.get(P::HazeDeltaMin))
        .then_some(WmoCode::Haze)
}

fn cloud_cover(obs: &Observation, t: &ThresholdSet) -> Option<WmoCode> {
    let delta = obs.delta?;
    let code = if delta > t.get(P::CloudClearDelta) {
        WmoCode::Clear
    } else if delta > t.get(P::CloudMainlyClearDelta) {
        WmoCode::MainlyClear
    } else if delta > t.get(P::CloudPartlyCloudyDelta) {
        WmoCode::PartlyCloudy
    } else {
        WmoCode::Overcast
    };
    Some(code)
}

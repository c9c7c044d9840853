//! WMO present-weather vocabulary and derived conditions

use serde::{Deserialize, Serialize};
use std::fmt;

/// WMO 4677 present-weather codes used by the station.
///
/// Showers (80-86) and dense drizzle (55) have no sensor evidence and are
/// never produced by the condition engine; they remain valid as feedback
/// corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum WmoCode {
    Clear = 0,
    MainlyClear = 1,
    PartlyCloudy = 2,
    Overcast = 3,
    Haze = 4,
    Mist = 10,
    ShallowFog = 11,
    Fog = 45,
    DepositingRimeFog = 48,
    DrizzleLight = 51,
    DrizzleModerate = 53,
    DrizzleDense = 55,
    FreezingDrizzleLight = 56,
    FreezingDrizzleDense = 57,
    RainSlight = 61,
    RainModerate = 63,
    RainHeavy = 65,
    FreezingRainLight = 66,
    FreezingRainHeavy = 67,
    SleetLight = 68,
    SleetHeavy = 69,
    SnowSlight = 71,
    SnowModerate = 73,
    SnowHeavy = 75,
    SnowGrains = 77,
    RainShowersSlight = 80,
    RainShowersModerate = 81,
    RainShowersViolent = 82,
    SnowShowersSlight = 85,
    SnowShowersHeavy = 86,
}

impl WmoCode {
    pub const ALL: [WmoCode; 30] = [
        WmoCode::Clear,
        WmoCode::MainlyClear,
        WmoCode::PartlyCloudy,
        WmoCode::Overcast,
        WmoCode::Haze,
        WmoCode::Mist,
        WmoCode::ShallowFog,
        WmoCode::Fog,
        WmoCode::DepositingRimeFog,
        WmoCode::DrizzleLight,
        WmoCode::DrizzleModerate,
        WmoCode::DrizzleDense,
        WmoCode::FreezingDrizzleLight,
        WmoCode::FreezingDrizzleDense,
        WmoCode::RainSlight,
        WmoCode::RainModerate,
        WmoCode::RainHeavy,
        WmoCode::FreezingRainLight,
        WmoCode::FreezingRainHeavy,
        WmoCode::SleetLight,
        WmoCode::SleetHeavy,
        WmoCode::SnowSlight,
        WmoCode::SnowModerate,
        WmoCode::SnowHeavy,
        WmoCode::SnowGrains,
        WmoCode::RainShowersSlight,
        WmoCode::RainShowersModerate,
        WmoCode::RainShowersViolent,
        WmoCode::SnowShowersSlight,
        WmoCode::SnowShowersHeavy,
    ];

    /// Numeric WMO code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Canonical snake_case condition name
    pub fn name(self) -> &'static str {
        match self {
            WmoCode::Clear => "clear",
            WmoCode::MainlyClear => "mainly_clear",
            WmoCode::PartlyCloudy => "partly_cloudy",
            WmoCode::Overcast => "overcast",
            WmoCode::Haze => "haze",
            WmoCode::Mist => "mist",
            WmoCode::ShallowFog => "shallow_fog",
            WmoCode::Fog => "fog",
            WmoCode::DepositingRimeFog => "depositing_rime_fog",
            WmoCode::DrizzleLight => "drizzle_light",
            WmoCode::DrizzleModerate => "drizzle_moderate",
            WmoCode::DrizzleDense => "drizzle_dense",
            WmoCode::FreezingDrizzleLight => "freezing_drizzle_light",
            WmoCode::FreezingDrizzleDense => "freezing_drizzle_dense",
            WmoCode::RainSlight => "rain_slight",
            WmoCode::RainModerate => "rain_moderate",
            WmoCode::RainHeavy => "rain_heavy",
            WmoCode::FreezingRainLight => "freezing_rain_light",
            WmoCode::FreezingRainHeavy => "freezing_rain_heavy",
            WmoCode::SleetLight => "sleet_light",
            WmoCode::SleetHeavy => "sleet_heavy",
            WmoCode::SnowSlight => "snow_slight",
            WmoCode::SnowModerate => "snow_moderate",
            WmoCode::SnowHeavy => "snow_heavy",
            WmoCode::SnowGrains => "snow_grains",
            WmoCode::RainShowersSlight => "rain_showers_slight",
            WmoCode::RainShowersModerate => "rain_showers_moderate",
            WmoCode::RainShowersViolent => "rain_showers_violent",
            WmoCode::SnowShowersSlight => "snow_showers_slight",
            WmoCode::SnowShowersHeavy => "snow_showers_heavy",
        }
    }

    /// Look up a code by its numeric value
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Whether this code describes falling precipitation
    pub fn is_precipitation(self) -> bool {
        self.code() >= 50
    }
}

impl fmt::Display for WmoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

impl From<WmoCode> for u8 {
    fn from(code: WmoCode) -> Self {
        code.code()
    }
}

impl TryFrom<u8> for WmoCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        WmoCode::from_code(value).ok_or_else(|| format!("unknown WMO code {}", value))
    }
}

impl TryFrom<i16> for WmoCode {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(WmoCode::from_code)
            .ok_or_else(|| format!("unknown WMO code {}", value))
    }
}

/// Output of the condition engine.
///
/// `code = None` is the indeterminate result: not enough evidence to name a
/// condition. It is a valid value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedCondition {
    pub code: Option<WmoCode>,
    pub name: Option<String>,
    /// Ambient minus sky temperature, rounded to 0.1 °C
    pub delta: Option<f64>,
}

impl DerivedCondition {
    pub fn indeterminate(delta: Option<f64>) -> Self {
        Self {
            code: None,
            name: None,
            delta,
        }
    }

    pub fn classified(code: WmoCode, delta: Option<f64>) -> Self {
        Self {
            code: Some(code),
            name: Some(code.name().to_string()),
            delta,
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        self.code.is_none()
    }
}

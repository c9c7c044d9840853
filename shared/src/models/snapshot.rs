//! Sensor snapshot models
//!
//! Both live sources deliver metric values already normalized by their
//! ingestion collaborators. Every field is optional: a missing value is
//! distinct from a zero reading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::psychrometrics::dewpoint_magnus;

/// Report pushed by the personal weather station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationSnapshot {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub dewpoint_c: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub wind_gust_ms: Option<f64>,
    /// Precipitation rate in mm/h
    pub precip_rate_mm: Option<f64>,
    /// Precipitation total since local midnight in mm
    pub precip_today_mm: Option<f64>,
    pub uv_index: Option<f64>,
    /// Solar radiation in W/m²
    pub solar_radiation: Option<f64>,
    pub aux1_temperature_c: Option<f64>,
    pub aux1_humidity_pct: Option<f64>,
    pub aux2_temperature_c: Option<f64>,
    pub aux2_humidity_pct: Option<f64>,
    /// Observation time reported by the station itself, if any
    pub observed_at: Option<DateTime<Utc>>,
}

impl StationSnapshot {
    /// Fill a missing dewpoint from temperature and humidity.
    pub fn with_derived_dewpoint(mut self) -> Self {
        if self.dewpoint_c.is_none() {
            if let (Some(temp), Some(humidity)) = (self.temperature_c, self.humidity_pct) {
                self.dewpoint_c = dewpoint_magnus(temp, humidity);
            }
        }
        self
    }
}

/// Reading from the infrared sky / rain sensor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkySnapshot {
    /// Infrared sky temperature in °C
    pub sky_temperature_c: Option<f64>,
    /// Raw rain sensor frequency counter (lower means wetter)
    pub rain_frequency: Option<i32>,
    /// Sky brightness in mag/arcsec²
    pub sky_brightness_mpsas: Option<f64>,
    pub is_raining: Option<bool>,
    pub is_daylight: Option<bool>,
}

/// Fused point-in-time view of both sources, the input of the condition engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub dewpoint_c: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub wind_gust_ms: Option<f64>,
    pub precip_rate_mm: Option<f64>,
    pub precip_today_mm: Option<f64>,
    pub uv_index: Option<f64>,
    pub solar_radiation: Option<f64>,
    pub aux1_temperature_c: Option<f64>,
    pub aux1_humidity_pct: Option<f64>,
    pub aux2_temperature_c: Option<f64>,
    pub aux2_humidity_pct: Option<f64>,
    pub sky_temperature_c: Option<f64>,
    pub rain_frequency: Option<i32>,
    pub sky_brightness_mpsas: Option<f64>,
    pub is_raining: Option<bool>,
    pub is_daylight: Option<bool>,
}

impl SensorSnapshot {
    /// Merge the latest known snapshot of each source.
    ///
    /// Each half is taken as-is regardless of the other's age; a missing
    /// source simply leaves its fields empty.
    pub fn fuse(station: Option<&StationSnapshot>, sky: Option<&SkySnapshot>) -> Self {
        let mut fused = SensorSnapshot::default();

        if let Some(s) = station {
            fused.temperature_c = s.temperature_c;
            fused.humidity_pct = s.humidity_pct;
            fused.dewpoint_c = s.dewpoint_c;
            fused.pressure_hpa = s.pressure_hpa;
            fused.wind_speed_ms = s.wind_speed_ms;
            fused.wind_direction_deg = s.wind_direction_deg;
            fused.wind_gust_ms = s.wind_gust_ms;
            fused.precip_rate_mm = s.precip_rate_mm;
            fused.precip_today_mm = s.precip_today_mm;
            fused.uv_index = s.uv_index;
            fused.solar_radiation = s.solar_radiation;
            fused.aux1_temperature_c = s.aux1_temperature_c;
            fused.aux1_humidity_pct = s.aux1_humidity_pct;
            fused.aux2_temperature_c = s.aux2_temperature_c;
            fused.aux2_humidity_pct = s.aux2_humidity_pct;
        }

        if let Some(c) = sky {
            fused.sky_temperature_c = c.sky_temperature_c;
            fused.rain_frequency = c.rain_frequency;
            fused.sky_brightness_mpsas = c.sky_brightness_mpsas;
            fused.is_raining = c.is_raining;
            fused.is_daylight = c.is_daylight;
        }

        fused
    }

    /// Ambient minus sky temperature, rounded to 0.1 °C
    pub fn delta(&self) -> Option<f64> {
        match (self.temperature_c, self.sky_temperature_c) {
            (Some(ambient), Some(sky)) => Some(((ambient - sky) * 10.0).round() / 10.0),
            _ => None,
        }
    }

    /// Ambient minus dewpoint
    pub fn spread(&self) -> Option<f64> {
        match (self.temperature_c, self.dewpoint_c) {
            (Some(ambient), Some(dewpoint)) => Some(ambient - dewpoint),
            _ => None,
        }
    }
}

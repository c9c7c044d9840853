//! Client for the infrared sky / rain sensor's JSON endpoint

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use shared::models::SkySnapshot;

use crate::error::{AppError, AppResult};

/// Sky sensor API client
#[derive(Clone)]
pub struct SkySensorClient {
    client: Client,
    url: String,
}

/// Payload served by the sensor daemon; `sky_temp_c` is mandatory
#[derive(Debug, Deserialize)]
struct SkySensorResponse {
    sky_temp_c: Option<f64>,
    rain_freq: Option<i32>,
    mpsas: Option<f64>,
    is_raining: Option<bool>,
    is_daylight: Option<bool>,
}

impl SkySensorResponse {
    fn into_snapshot(self) -> AppResult<SkySnapshot> {
        let sky_temperature_c = self
            .sky_temp_c
            .filter(|t| t.is_finite())
            .ok_or_else(|| AppError::SourceUnavailable("response has no sky_temp_c".to_string()))?;

        Ok(SkySnapshot {
            sky_temperature_c: Some(sky_temperature_c),
            rain_frequency: self.rain_freq,
            sky_brightness_mpsas: self.mpsas,
            is_raining: self.is_raining,
            is_daylight: self.is_daylight,
        })
    }
}

impl SkySensorClient {
    pub fn new(url: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Sky sensor client: {}", e)))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the sensor's current reading
    pub async fn fetch(&self) -> AppResult<SkySnapshot> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SourceUnavailable(format!(
                "sensor returned {} - {}",
                status, body
            )));
        }

        let data: SkySensorResponse = response
            .json()
            .await
            .map_err(|e| AppError::SourceUnavailable(format!("invalid response: {}", e)))?;

        data.into_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sensor_payload() {
        let json = r#"{
            "timestamp": "2026-01-10T21:04:00+00:00",
            "sky_temp_c": -18.4,
            "ambient_temp_c": 4.1,
            "rain_freq": 2710,
            "mpsas": 19.2,
            "is_raining": false,
            "is_daylight": false,
            "quality": "good"
        }"#;
        let data: SkySensorResponse = serde_json::from_str(json).unwrap();
        let snapshot = data.into_snapshot().unwrap();

        assert_eq!(snapshot.sky_temperature_c, Some(-18.4));
        assert_eq!(snapshot.rain_frequency, Some(2710));
        assert_eq!(snapshot.is_raining, Some(false));
    }

    #[test]
    fn test_missing_sky_temperature_is_unavailable() {
        let data: SkySensorResponse = serde_json::from_str(r#"{"sky_temp_c": null}"#).unwrap();
        assert!(matches!(
            data.into_snapshot(),
            Err(AppError::SourceUnavailable(_))
        ));
    }
}

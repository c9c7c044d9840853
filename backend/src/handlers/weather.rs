//! HTTP handlers for current conditions, history and station status

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::WeatherReading;
use shared::snapshot_store::SourceLiveness;
use shared::types::{HistoryWindow, StationStatus};

use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Serialize)]
pub struct CurrentWeatherResponse {
    #[serde(flatten)]
    pub reading: WeatherReading,
    pub data_age_s: i64,
    pub stale: bool,
}

/// Latest reading with its age
pub async fn get_current_weather(
    State(state): State<AppState>,
) -> AppResult<Json<CurrentWeatherResponse>> {
    let reading = state
        .readings
        .latest()
        .await?
        .ok_or_else(|| AppError::NoTarget("No reading has been recorded yet".to_string()))?;

    let data_age_s = (Utc::now() - reading.timestamp).num_seconds().max(0);
    Ok(Json(CurrentWeatherResponse {
        stale: data_age_s > state.config.staleness.stale_after_secs,
        data_age_s,
        reading,
    }))
}

/// Query parameters for history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub hours: Option<i64>,
    pub format: Option<String>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub hours: u32,
    pub count: usize,
    pub readings: Vec<WeatherReading>,
}

/// Readings of the last `hours` hours, oldest first, as JSON or CSV
pub async fn get_weather_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Response> {
    let window = HistoryWindow::from_hours(query.hours);
    let readings = state
        .readings
        .history(Utc::now() - window.duration())
        .await?;

    match query.format.as_deref() {
        None | Some("json") => Ok(Json(HistoryResponse {
            hours: window.hours(),
            count: readings.len(),
            readings,
        })
        .into_response()),
        Some("csv") => {
            let body = history_csv(&readings)?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"weather-history.csv\"",
                    ),
                ],
                body,
            )
                .into_response())
        }
        Some(other) => Err(AppError::Validation {
            field: "format".to_string(),
            message: format!("Unsupported format '{}', expected json or csv", other),
        }),
    }
}

/// One flat CSV line per reading
#[derive(Serialize)]
struct HistoryCsvRow<'a> {
    id: i64,
    timestamp: String,
    temperature_c: Option<f64>,
    humidity_pct: Option<f64>,
    dewpoint_c: Option<f64>,
    pressure_hpa: Option<f64>,
    wind_speed_ms: Option<f64>,
    wind_direction_deg: Option<f64>,
    wind_gust_ms: Option<f64>,
    precip_rate_mm: Option<f64>,
    precip_today_mm: Option<f64>,
    uv_index: Option<f64>,
    solar_radiation: Option<f64>,
    sky_temperature_c: Option<f64>,
    rain_frequency: Option<i32>,
    sky_brightness_mpsas: Option<f64>,
    is_raining: Option<bool>,
    is_daylight: Option<bool>,
    delta_c: Option<f64>,
    wmo_code: Option<u8>,
    condition: Option<&'a str>,
    feedback_is_correct: Option<bool>,
    feedback_code: Option<u8>,
}

impl<'a> From<&'a WeatherReading> for HistoryCsvRow<'a> {
    fn from(r: &'a WeatherReading) -> Self {
        let s = &r.snapshot;
        Self {
            id: r.id,
            timestamp: r.timestamp.to_rfc3339(),
            temperature_c: s.temperature_c,
            humidity_pct: s.humidity_pct,
            dewpoint_c: s.dewpoint_c,
            pressure_hpa: s.pressure_hpa,
            wind_speed_ms: s.wind_speed_ms,
            wind_direction_deg: s.wind_direction_deg,
            wind_gust_ms: s.wind_gust_ms,
            precip_rate_mm: s.precip_rate_mm,
            precip_today_mm: s.precip_today_mm,
            uv_index: s.uv_index,
            solar_radiation: s.solar_radiation,
            sky_temperature_c: s.sky_temperature_c,
            rain_frequency: s.rain_frequency,
            sky_brightness_mpsas: s.sky_brightness_mpsas,
            is_raining: s.is_raining,
            is_daylight: s.is_daylight,
            delta_c: r.condition.delta,
            wmo_code: r.condition.code.map(|c| c.code()),
            condition: r.condition.name.as_deref(),
            feedback_is_correct: r.feedback.as_ref().map(|f| f.is_correct),
            feedback_code: r
                .feedback
                .as_ref()
                .and_then(|f| f.corrected_code)
                .map(|c| c.code()),
        }
    }
}

fn history_csv(readings: &[WeatherReading]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for reading in readings {
        writer
            .serialize(HistoryCsvRow::from(reading))
            .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: StationStatus,
    pub last_update: Option<DateTime<Utc>>,
    pub data_age_s: Option<i64>,
    pub stale_after_s: i64,
    pub reading_count: i64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub sources: Vec<SourceLiveness>,
}

/// Liveness of the reading log and of each source
pub async fn get_station_status(State(state): State<AppState>) -> AppResult<Json<StatusResponse>> {
    let now = Utc::now();
    let stats = state.readings.stats().await?;
    let stale_after_s = state.config.staleness.stale_after_secs;

    let data_age_s = state
        .ingestion
        .data_age(now)
        .or_else(|| stats.newest.map(|t| now - t))
        .map(|age| age.num_seconds().max(0));

    let status = match data_age_s {
        None => StationStatus::NoData,
        Some(age) if age > stale_after_s => StationStatus::Stale,
        Some(_) => StationStatus::Ok,
    };

    Ok(Json(StatusResponse {
        status,
        last_update: stats.newest,
        data_age_s,
        stale_after_s,
        reading_count: stats.count,
        oldest_entry: stats.oldest,
        sources: state.ingestion.liveness(now),
    }))
}

//! PostgreSQL reading log

use chrono::{DateTime, Utc};
use shared::models::{DerivedCondition, Feedback, NewReading, SensorSnapshot, WeatherReading, WmoCode};
use sqlx::{FromRow, PgPool};

use super::{feedback_rejection, ReadingRepository, ReadingStats};
use crate::error::AppResult;

const READING_COLUMNS: &str = r#"
    id, recorded_at,
    temperature_c, humidity_pct, dewpoint_c, pressure_hpa,
    wind_speed_ms, wind_direction_deg, wind_gust_ms,
    precip_rate_mm, precip_today_mm, uv_index, solar_radiation,
    aux1_temperature_c, aux1_humidity_pct, aux2_temperature_c, aux2_humidity_pct,
    sky_temperature_c, rain_frequency, sky_brightness_mpsas, is_raining, is_daylight,
    wmo_code, wmo_name, delta_c,
    feedback_is_correct, feedback_code, feedback_comment, feedback_at
"#;

#[derive(Debug, FromRow)]
struct ReadingRow {
    id: i64,
    recorded_at: DateTime<Utc>,
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
    aux1_temperature_c: Option<f64>,
    aux1_humidity_pct: Option<f64>,
    aux2_temperature_c: Option<f64>,
    aux2_humidity_pct: Option<f64>,
    sky_temperature_c: Option<f64>,
    rain_frequency: Option<i32>,
    sky_brightness_mpsas: Option<f64>,
    is_raining: Option<bool>,
    is_daylight: Option<bool>,
    wmo_code: Option<i16>,
    wmo_name: Option<String>,
    delta_c: Option<f64>,
    feedback_is_correct: Option<bool>,
    feedback_code: Option<i16>,
    feedback_comment: Option<String>,
    feedback_at: Option<DateTime<Utc>>,
}

impl From<ReadingRow> for WeatherReading {
    fn from(row: ReadingRow) -> Self {
        let code = row.wmo_code.and_then(|c| WmoCode::try_from(c).ok());
        let condition = DerivedCondition {
            code,
            name: code.map(|c| c.name().to_string()).or(row.wmo_name),
            delta: row.delta_c,
        };

        let feedback = match (row.feedback_is_correct, row.feedback_at) {
            (Some(is_correct), Some(submitted_at)) => Some(Feedback {
                is_correct,
                corrected_code: row.feedback_code.and_then(|c| WmoCode::try_from(c).ok()),
                comment: row.feedback_comment,
                submitted_at,
            }),
            _ => None,
        };

        WeatherReading {
            id: row.id,
            timestamp: row.recorded_at,
            snapshot: SensorSnapshot {
                temperature_c: row.temperature_c,
                humidity_pct: row.humidity_pct,
                dewpoint_c: row.dewpoint_c,
                pressure_hpa: row.pressure_hpa,
                wind_speed_ms: row.wind_speed_ms,
                wind_direction_deg: row.wind_direction_deg,
                wind_gust_ms: row.wind_gust_ms,
                precip_rate_mm: row.precip_rate_mm,
                precip_today_mm: row.precip_today_mm,
                uv_index: row.uv_index,
                solar_radiation: row.solar_radiation,
                aux1_temperature_c: row.aux1_temperature_c,
                aux1_humidity_pct: row.aux1_humidity_pct,
                aux2_temperature_c: row.aux2_temperature_c,
                aux2_humidity_pct: row.aux2_humidity_pct,
                sky_temperature_c: row.sky_temperature_c,
                rain_frequency: row.rain_frequency,
                sky_brightness_mpsas: row.sky_brightness_mpsas,
                is_raining: row.is_raining,
                is_daylight: row.is_daylight,
            },
            condition,
            feedback,
        }
    }
}

#[derive(Clone)]
pub struct PgReadingRepository {
    db: PgPool,
}

impl PgReadingRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[axum::async_trait]
impl ReadingRepository for PgReadingRepository {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn append(&self, reading: NewReading) -> AppResult<WeatherReading> {
        let s = &reading.snapshot;
        let c = &reading.condition;

        let row = sqlx::query_as::<_, ReadingRow>(&format!(
            r#"
            INSERT INTO weather_readings (
                recorded_at,
                temperature_c, humidity_pct, dewpoint_c, pressure_hpa,
                wind_speed_ms, wind_direction_deg, wind_gust_ms,
                precip_rate_mm, precip_today_mm, uv_index, solar_radiation,
                aux1_temperature_c, aux1_humidity_pct, aux2_temperature_c, aux2_humidity_pct,
                sky_temperature_c, rain_frequency, sky_brightness_mpsas, is_raining, is_daylight,
                wmo_code, wmo_name, delta_c
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24)
            RETURNING {}
            "#,
            READING_COLUMNS
        ))
        .bind(reading.timestamp)
        .bind(s.temperature_c)
        .bind(s.humidity_pct)
        .bind(s.dewpoint_c)
        .bind(s.pressure_hpa)
        .bind(s.wind_speed_ms)
        .bind(s.wind_direction_deg)
        .bind(s.wind_gust_ms)
        .bind(s.precip_rate_mm)
        .bind(s.precip_today_mm)
        .bind(s.uv_index)
        .bind(s.solar_radiation)
        .bind(s.aux1_temperature_c)
        .bind(s.aux1_humidity_pct)
        .bind(s.aux2_temperature_c)
        .bind(s.aux2_humidity_pct)
        .bind(s.sky_temperature_c)
        .bind(s.rain_frequency)
        .bind(s.sky_brightness_mpsas)
        .bind(s.is_raining)
        .bind(s.is_daylight)
        .bind(c.code.map(|code| i16::from(code.code())))
        .bind(&c.name)
        .bind(c.delta)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn latest(&self) -> AppResult<Option<WeatherReading>> {
        let row = sqlx::query_as::<_, ReadingRow>(&format!(
            "SELECT {} FROM weather_readings ORDER BY id DESC LIMIT 1",
            READING_COLUMNS
        ))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn history(&self, since: DateTime<Utc>) -> AppResult<Vec<WeatherReading>> {
        let rows = sqlx::query_as::<_, ReadingRow>(&format!(
            "SELECT {} FROM weather_readings WHERE recorded_at > $1 ORDER BY recorded_at ASC, id ASC",
            READING_COLUMNS
        ))
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn labelled_wrong(&self) -> AppResult<Vec<WeatherReading>> {
        let rows = sqlx::query_as::<_, ReadingRow>(&format!(
            "SELECT {} FROM weather_readings WHERE feedback_is_correct = FALSE ORDER BY id ASC",
            READING_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn attach_feedback(
        &self,
        expected_id: Option<i64>,
        feedback: &Feedback,
    ) -> AppResult<WeatherReading> {
        // "Still the latest and still unlabelled" is checked by the UPDATE
        // itself; a concurrent writer re-evaluates the predicate after the
        // row lock is released and matches nothing.
        let updated = sqlx::query_as::<_, ReadingRow>(&format!(
            r#"
            UPDATE weather_readings
            SET feedback_is_correct = $1,
                feedback_code = $2,
                feedback_comment = $3,
                feedback_at = $4
            WHERE id = (SELECT MAX(id) FROM weather_readings)
              AND feedback_is_correct IS NULL
              AND ($5::BIGINT IS NULL OR id = $5)
            RETURNING {}
            "#,
            READING_COLUMNS
        ))
        .bind(feedback.is_correct)
        .bind(feedback.corrected_code.map(|code| i16::from(code.code())))
        .bind(&feedback.comment)
        .bind(feedback.submitted_at)
        .bind(expected_id)
        .fetch_optional(&self.db)
        .await?;

        match updated {
            Some(row) => Ok(row.into()),
            None => {
                let latest = self.latest().await?;
                Err(feedback_rejection(latest.as_ref(), expected_id))
            }
        }
    }

    async fn stats(&self) -> AppResult<ReadingStats> {
        let (count, oldest, newest): (i64, Option<DateTime<Utc>>, Option<DateTime<Utc>>) =
            sqlx::query_as(
                "SELECT COUNT(*), MIN(recorded_at), MAX(recorded_at) FROM weather_readings",
            )
            .fetch_one(&self.db)
            .await?;

        Ok(ReadingStats {
            count,
            oldest,
            newest,
        })
    }
}

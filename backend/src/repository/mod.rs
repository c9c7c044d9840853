//! Reading persistence
//!
//! The reading log is append-only. The only mutation is attaching feedback
//! to the latest row, which every implementation performs as a single
//! check-and-set.

mod memory;
mod postgres;

pub use memory::MemoryReadingRepository;
pub use postgres::PgReadingRepository;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{Feedback, NewReading, WeatherReading};

use crate::error::AppResult;

/// Row count and time span of the reading log
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadingStats {
    pub count: i64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

#[axum::async_trait]
pub trait ReadingRepository: Send + Sync {
    /// Short name shown by the health endpoint
    fn backend_name(&self) -> &'static str;

    async fn ping(&self) -> AppResult<()>;

    async fn append(&self, reading: NewReading) -> AppResult<WeatherReading>;

    async fn latest(&self) -> AppResult<Option<WeatherReading>>;

    /// Readings newer than `since`, oldest first
    async fn history(&self, since: DateTime<Utc>) -> AppResult<Vec<WeatherReading>>;

    /// Every reading whose feedback marks the condition wrong
    async fn labelled_wrong(&self) -> AppResult<Vec<WeatherReading>>;

    /// Attach feedback to the latest reading.
    ///
    /// Fails with `NoTarget` when the log is empty and `FeedbackConflict`
    /// when the latest reading already carries feedback or is not
    /// `expected_id`.
    async fn attach_feedback(
        &self,
        expected_id: Option<i64>,
        feedback: &Feedback,
    ) -> AppResult<WeatherReading>;

    async fn stats(&self) -> AppResult<ReadingStats>;
}

/// Work out why a feedback check-and-set matched nothing
pub(crate) fn feedback_rejection(
    latest: Option<&WeatherReading>,
    expected_id: Option<i64>,
) -> crate::error::AppError {
    use crate::error::AppError;

    match (latest, expected_id) {
        (None, _) => AppError::NoTarget("No reading has been recorded yet".to_string()),
        (Some(reading), Some(expected)) if expected != reading.id => {
            AppError::FeedbackConflict(format!(
                "Reading {} is no longer the latest (latest is {})",
                expected, reading.id
            ))
        }
        (Some(reading), _) => AppError::FeedbackConflict(format!(
            "Reading {} already has feedback",
            reading.id
        )),
    }
}

//! In-process reading log, used when no database is configured and in tests

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use shared::models::{Feedback, NewReading, WeatherReading};

use super::{feedback_rejection, ReadingRepository, ReadingStats};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
struct Log {
    readings: Vec<WeatherReading>,
    next_id: i64,
    unavailable: bool,
}

#[derive(Debug, Default)]
pub struct MemoryReadingRepository {
    log: Mutex<Log>,
}

impl MemoryReadingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail, as a lost database connection would
    #[cfg(test)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[axum::async_trait]
impl ReadingRepository for MemoryReadingRepository {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn append(&self, reading: NewReading) -> AppResult<WeatherReading> {
        let mut log = self.lock();
        if log.unavailable {
            return Err(AppError::Persistence("reading log unavailable".to_string()));
        }

        log.next_id += 1;
        let stored = WeatherReading {
            id: log.next_id,
            timestamp: reading.timestamp,
            snapshot: reading.snapshot,
            condition: reading.condition,
            feedback: None,
        };
        log.readings.push(stored.clone());
        Ok(stored)
    }

    async fn latest(&self) -> AppResult<Option<WeatherReading>> {
        Ok(self.lock().readings.last().cloned())
    }

    async fn history(&self, since: DateTime<Utc>) -> AppResult<Vec<WeatherReading>> {
        Ok(self
            .lock()
            .readings
            .iter()
            .filter(|r| r.timestamp > since)
            .cloned()
            .collect())
    }

    async fn labelled_wrong(&self) -> AppResult<Vec<WeatherReading>> {
        Ok(self
            .lock()
            .readings
            .iter()
            .filter(|r| r.is_labelled_wrong())
            .cloned()
            .collect())
    }

    async fn attach_feedback(
        &self,
        expected_id: Option<i64>,
        feedback: &Feedback,
    ) -> AppResult<WeatherReading> {
        let mut log = self.lock();
        match log.readings.last_mut() {
            Some(latest)
                if latest.feedback.is_none() && expected_id.map_or(true, |id| id == latest.id) =>
            {
                latest.feedback = Some(feedback.clone());
                Ok(latest.clone())
            }
            latest => Err(feedback_rejection(latest.as_deref(), expected_id)),
        }
    }

    async fn stats(&self) -> AppResult<ReadingStats> {
        let log = self.lock();
        Ok(ReadingStats {
            count: log.readings.len() as i64,
            oldest: log.readings.first().map(|r| r.timestamp),
            newest: log.readings.last().map(|r| r.timestamp),
        })
    }
}

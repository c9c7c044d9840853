//! Feedback on the latest reading

use std::sync::Arc;

use chrono::Utc;
use shared::models::{FeedbackSubmission, WeatherReading};
use shared::validation::validate_feedback;

use crate::error::AppResult;
use crate::repository::ReadingRepository;

/// Feedback service attaching human judgments to readings
#[derive(Clone)]
pub struct FeedbackService {
    readings: Arc<dyn ReadingRepository>,
}

impl FeedbackService {
    pub fn new(readings: Arc<dyn ReadingRepository>) -> Self {
        Self { readings }
    }

    /// Validate a submission and attach it to the latest reading, once
    pub async fn submit(&self, submission: FeedbackSubmission) -> AppResult<WeatherReading> {
        let feedback = validate_feedback(&submission, Utc::now())?;
        let reading = self
            .readings
            .attach_feedback(submission.reading_id, &feedback)
            .await?;

        match feedback.corrected_code {
            Some(corrected) => tracing::info!(
                reading_id = reading.id,
                "Feedback: derived {:?} corrected to {}",
                reading.condition.code.map(|c| c.code()),
                corrected.code()
            ),
            None => tracing::info!(reading_id = reading.id, "Feedback: derived condition confirmed"),
        }

        Ok(reading)
    }
}

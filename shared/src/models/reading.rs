//! Persisted readings and the feedback attached to them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{DerivedCondition, SensorSnapshot, WmoCode};

/// One ingestion cycle's result, as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: SensorSnapshot,
    #[serde(flatten)]
    pub condition: DerivedCondition,
    pub feedback: Option<Feedback>,
}

impl WeatherReading {
    pub fn is_labelled_wrong(&self) -> bool {
        self.feedback.as_ref().is_some_and(|f| !f.is_correct)
    }
}

/// A reading about to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub timestamp: DateTime<Utc>,
    pub snapshot: SensorSnapshot,
    pub condition: DerivedCondition,
}

/// Human judgment of a reading's derived condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub is_correct: bool,
    /// Present exactly when `is_correct` is false
    pub corrected_code: Option<WmoCode>,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Raw feedback as submitted through the API
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FeedbackSubmission {
    pub is_correct: bool,
    pub corrected_code: Option<i32>,
    #[validate(length(max = 500))]
    pub comment: Option<String>,
    /// Id of the reading the submitter was looking at; must still be the latest
    pub reading_id: Option<i64>,
}

//! Validation of externally submitted data

use chrono::{DateTime, Utc};
use thiserror::Error;
use validator::Validate;

use crate::models::{Feedback, FeedbackSubmission, WmoCode};

/// A submission that cannot be accepted as given
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedbackError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
}

impl FeedbackError {
    fn field(field: &str, message: impl Into<String>) -> Self {
        FeedbackError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Check a feedback submission and turn it into storable feedback.
///
/// A wrong judgment must name the correct code; a correct judgment drops any
/// code it carries. Comments are trimmed and blank comments dropped.
pub fn validate_feedback(
    submission: &FeedbackSubmission,
    submitted_at: DateTime<Utc>,
) -> Result<Feedback, FeedbackError> {
    if submission.validate().is_err() {
        return Err(FeedbackError::field(
            "comment",
            "Comment must be at most 500 characters",
        ));
    }

    let corrected_code = if submission.is_correct {
        None
    } else {
        let raw = submission.corrected_code.ok_or_else(|| {
            FeedbackError::field(
                "corrected_code",
                "A corrected code is required when the condition is marked wrong",
            )
        })?;
        let code = u8::try_from(raw)
            .ok()
            .and_then(WmoCode::from_code)
            .ok_or_else(|| {
                FeedbackError::field("corrected_code", format!("Unknown WMO code {}", raw))
            })?;
        Some(code)
    };

    let comment = submission
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(Feedback {
        is_correct: submission.is_correct,
        corrected_code,
        comment,
        submitted_at,
    })
}

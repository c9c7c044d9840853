//! HTTP handlers for feedback and error patterns

use axum::{extract::State, http::StatusCode, Json};
use shared::models::{ErrorPattern, FeedbackSubmission, WeatherReading};

use crate::error::AppResult;
use crate::services::{AnalysisService, FeedbackService};
use crate::AppState;

/// Judge the latest reading's condition
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(submission): Json<FeedbackSubmission>,
) -> AppResult<(StatusCode, Json<WeatherReading>)> {
    let service = FeedbackService::new(state.readings.clone());
    let reading = service.submit(submission).await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

/// Wrong-labelled readings grouped by observed and corrected code
pub async fn list_error_patterns(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ErrorPattern>>> {
    let service = AnalysisService::new(
        state.readings.clone(),
        state.thresholds.clone(),
        state.config.feedback.min_evidence,
    );
    let patterns = service.patterns().await?;
    Ok(Json(patterns))
}

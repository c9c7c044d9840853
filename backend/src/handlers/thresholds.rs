//! HTTP handlers for the threshold set

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shared::thresholds::{ThresholdChange, ThresholdParam, ThresholdSet};

use crate::error::{AppError, AppResult};
use crate::services::analysis::RecommendationReport;
use crate::services::thresholds::ApplyResult;
use crate::services::AnalysisService;
use crate::AppState;

#[derive(Serialize)]
pub struct ParameterInfo {
    pub name: ThresholdParam,
    pub value: f64,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Serialize)]
pub struct ThresholdsResponse {
    pub revision: String,
    pub vocabulary_version: u32,
    pub thresholds: ThresholdSet,
    pub parameters: Vec<ParameterInfo>,
}

/// Current threshold set with its revision
pub async fn get_thresholds(State(state): State<AppState>) -> Json<ThresholdsResponse> {
    let current = state.thresholds.current();
    let parameters = current
        .thresholds
        .iter()
        .map(|(name, value)| {
            let (min, max) = name.valid_range();
            ParameterInfo {
                name,
                value,
                default: name.default_value(),
                min,
                max,
            }
        })
        .collect();

    Json(ThresholdsResponse {
        revision: current.revision.clone(),
        vocabulary_version: current.vocabulary_version,
        thresholds: current.thresholds.clone(),
        parameters,
    })
}

/// Suggested changes derived from feedback; never applied automatically
pub async fn get_recommendations(
    State(state): State<AppState>,
) -> AppResult<Json<RecommendationReport>> {
    let service = AnalysisService::new(
        state.readings.clone(),
        state.thresholds.clone(),
        state.config.feedback.min_evidence,
    );
    let report = service.recommendations().await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub changes: Vec<ThresholdChange>,
}

/// Apply operator-approved changes
pub async fn apply_thresholds(
    State(state): State<AppState>,
    Json(request): Json<ApplyRequest>,
) -> AppResult<Json<ApplyResult>> {
    if request.changes.is_empty() {
        return Err(AppError::Validation {
            field: "changes".to_string(),
            message: "At least one change is required".to_string(),
        });
    }

    let result = state.thresholds.apply(&request.changes).await?;
    Ok(Json(result))
}

//! HTTP handlers for pushed sensor snapshots

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use shared::models::{SkySnapshot, StationSnapshot};

use crate::services::ingestion::CycleOutcome;
use crate::AppState;

/// Accept a station report and run an ingestion cycle.
///
/// Always 202: a cycle that could not be persisted reports `persisted: false`.
pub async fn ingest_station(
    State(state): State<AppState>,
    Json(snapshot): Json<StationSnapshot>,
) -> (StatusCode, Json<CycleOutcome>) {
    let outcome = state.ingestion.ingest_station(snapshot).await;
    (StatusCode::ACCEPTED, Json(outcome))
}

#[derive(Serialize)]
pub struct SkyIngestResponse {
    /// Absent until the station has reported at least once
    pub cycle: Option<CycleOutcome>,
}

/// Accept a sky sensor reading pushed instead of polled
pub async fn ingest_sky(
    State(state): State<AppState>,
    Json(snapshot): Json<SkySnapshot>,
) -> (StatusCode, Json<SkyIngestResponse>) {
    let cycle = state.ingestion.ingest_sky(snapshot).await;
    (StatusCode::ACCEPTED, Json(SkyIngestResponse { cycle }))
}

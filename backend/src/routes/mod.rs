//! Route definitions for the weather station

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::operator_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_station_status))
        // Sensor pushes
        .nest("/ingest", ingest_routes())
        // Read projections
        .nest("/weather", weather_routes())
        // Human feedback
        .nest("/feedback", feedback_routes())
        // Threshold tuning
        .nest("/thresholds", threshold_routes(state))
}

fn ingest_routes() -> Router<AppState> {
    Router::new()
        .route("/station", post(handlers::ingest_station))
        .route("/sky", post(handlers::ingest_sky))
}

fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(handlers::get_current_weather))
        .route("/history", get(handlers::get_weather_history))
}

fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::submit_feedback))
        .route("/patterns", get(handlers::list_error_patterns))
}

/// Reads are public; apply requires the operator token
fn threshold_routes(state: AppState) -> Router<AppState> {
    let operator = Router::new()
        .route("/apply", post(handlers::apply_thresholds))
        .route_layer(middleware::from_fn_with_state(state, operator_middleware));

    Router::new()
        .route("/", get(handlers::get_thresholds))
        .route("/recommendations", get(handlers::get_recommendations))
        .merge(operator)
}

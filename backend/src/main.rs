//! Weather station backend server
//!
//! Derives the present-weather condition from a personal weather station and
//! an infrared sky sensor, records every reading, and tunes its own
//! thresholds from human feedback.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod repository;
mod routes;
mod services;

pub use config::Config;

use repository::{MemoryReadingRepository, PgReadingRepository, ReadingRepository};
use services::{IngestionCoordinator, ThresholdStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub readings: Arc<dyn ReadingRepository>,
    pub thresholds: Arc<ThresholdStore>,
    pub ingestion: Arc<IngestionCoordinator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wx_station=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting weather station server");
    tracing::info!("Environment: {}", config.environment);

    let readings: Arc<dyn ReadingRepository> = match &config.database.url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(url)
                .await?;
            tracing::info!("Database connection established");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&db_pool).await?;
            tracing::info!("Migrations completed");

            Arc::new(PgReadingRepository::new(db_pool))
        }
        None => {
            tracing::warn!("No database configured; readings are kept in memory only");
            Arc::new(MemoryReadingRepository::new())
        }
    };

    let thresholds = Arc::new(
        ThresholdStore::open(&config.thresholds.path, &config.thresholds.backup_dir).await?,
    );

    let ingestion = Arc::new(IngestionCoordinator::new(
        readings.clone(),
        thresholds.clone(),
    ));
    ingestion.prime().await?;

    match &config.sky_sensor.url {
        Some(url) => {
            let client = external::SkySensorClient::new(url.clone(), config.sky_sensor.timeout())?;
            services::poller::spawn_sky_poller(
                client,
                ingestion.clone(),
                config.sky_sensor.poll_interval(),
            );
        }
        None => tracing::info!("No sky sensor URL configured; expecting pushed sky readings"),
    }

    // Create application state
    let state = AppState {
        config: Arc::new(config.clone()),
        readings,
        thresholds,
        ingestion,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Weather Station API v1"
}

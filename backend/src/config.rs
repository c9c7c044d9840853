//! Configuration management for the weather station
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with WX__ prefix

use std::path::PathBuf;
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Secondary cloud / rain sensor
    pub sky_sensor: SkySensorConfig,

    pub thresholds: ThresholdsConfig,

    pub feedback: FeedbackConfig,

    pub staleness: StalenessConfig,

    pub operator: OperatorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; readings are kept in memory when absent
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SkySensorConfig {
    /// JSON endpoint of the sensor; polling is disabled when absent
    pub url: Option<String>,

    pub timeout_secs: u64,

    pub poll_interval_secs: u64,
}

impl SkySensorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdsConfig {
    /// Live threshold file
    pub path: PathBuf,

    /// Directory receiving a copy of the previous file on every apply
    pub backup_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedbackConfig {
    /// Wrong-labelled readings a pattern needs before it yields a recommendation
    pub min_evidence: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StalenessConfig {
    pub stale_after_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OperatorConfig {
    /// Bearer token required to apply threshold changes
    pub api_token: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("WX_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("sky_sensor.timeout_secs", 5)?
            .set_default("sky_sensor.poll_interval_secs", 30)?
            .set_default("thresholds.path", "data/thresholds.json")?
            .set_default("thresholds.backup_dir", "data/threshold-backups")?
            .set_default("feedback.min_evidence", 3)?
            .set_default("staleness.stale_after_secs", 300)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WX_ prefix)
            .add_source(
                Environment::with_prefix("WX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;

        if config.operator.api_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "operator.api_token must not be empty".to_string(),
            ));
        }

        Ok(config)
    }
}

//! Ingestion cycles
//!
//! Every arrival from either source updates the snapshot store and runs one
//! cycle: fuse the latest snapshot of each source, derive the condition with
//! the live thresholds, append the reading. A cycle that cannot be persisted
//! is logged and dropped; the next one does not depend on it.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use shared::engine;
use shared::models::{DerivedCondition, NewReading, SkySnapshot, StationSnapshot, WeatherReading};
use shared::snapshot_store::{SnapshotStore, SourceLiveness};

use crate::error::AppResult;
use crate::repository::ReadingRepository;
use crate::services::thresholds::ThresholdStore;

/// Result of one ingestion cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub condition: DerivedCondition,
    pub matched_rule: Option<&'static str>,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_id: Option<i64>,
}

pub struct IngestionCoordinator {
    snapshots: SnapshotStore,
    readings: Arc<dyn ReadingRepository>,
    thresholds: Arc<ThresholdStore>,
    last_persisted: Mutex<Option<DateTime<Utc>>>,
}

impl IngestionCoordinator {
    pub fn new(readings: Arc<dyn ReadingRepository>, thresholds: Arc<ThresholdStore>) -> Self {
        Self {
            snapshots: SnapshotStore::new(),
            readings,
            thresholds,
            last_persisted: Mutex::new(None),
        }
    }

    /// Pick up the newest persisted reading so data age survives a restart
    pub async fn prime(&self) -> AppResult<()> {
        if let Some(latest) = self.readings.latest().await? {
            self.mark_persisted(latest.timestamp);
        }
        Ok(())
    }

    /// Station push: store the snapshot and run a cycle
    pub async fn ingest_station(&self, snapshot: StationSnapshot) -> CycleOutcome {
        self.snapshots
            .record_station(snapshot.with_derived_dewpoint(), Utc::now());
        self.run_cycle().await
    }

    /// Sky sensor arrival: store the snapshot, and run a cycle once the
    /// station has reported at least once
    pub async fn ingest_sky(&self, snapshot: SkySnapshot) -> Option<CycleOutcome> {
        self.snapshots.record_sky(snapshot, Utc::now());
        self.run_cycle_if_station_known().await
    }

    /// Cycle with whatever is currently known, used when a poll fails
    pub async fn run_cycle_if_station_known(&self) -> Option<CycleOutcome> {
        if self.snapshots.latest().station.is_none() {
            tracing::debug!("No station snapshot yet; skipping cycle");
            return None;
        }
        Some(self.run_cycle().await)
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        let fused = self.snapshots.latest().fused();
        let thresholds = self.thresholds.current();
        let evaluation = engine::evaluate(&fused, &thresholds.thresholds);
        let timestamp = Utc::now();

        let reading = NewReading {
            timestamp,
            snapshot: fused,
            condition: evaluation.condition.clone(),
        };

        match self.readings.append(reading).await {
            Ok(stored) => {
                self.mark_persisted(stored.timestamp);
                log_cycle(&stored, evaluation.matched_rule);
                CycleOutcome {
                    condition: evaluation.condition,
                    matched_rule: evaluation.matched_rule,
                    persisted: true,
                    reading_id: Some(stored.id),
                }
            }
            Err(e) => {
                tracing::error!("Ingestion cycle dropped, reading not persisted: {}", e);
                CycleOutcome {
                    condition: evaluation.condition,
                    matched_rule: evaluation.matched_rule,
                    persisted: false,
                    reading_id: None,
                }
            }
        }
    }

    /// Time since the last successfully persisted reading
    pub fn data_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_persisted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|t| now - t)
    }

    pub fn liveness(&self, now: DateTime<Utc>) -> Vec<SourceLiveness> {
        self.snapshots.liveness(now)
    }

    fn mark_persisted(&self, at: DateTime<Utc>) {
        let mut last = self
            .last_persisted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.map_or(true, |t| at > t) {
            *last = Some(at);
        }
    }
}

fn log_cycle(reading: &WeatherReading, matched_rule: Option<&str>) {
    match reading.condition.code {
        Some(code) => tracing::info!(
            reading_id = reading.id,
            rule = matched_rule.unwrap_or("-"),
            delta = ?reading.condition.delta,
            "Derived WMO {} ({})",
            code.code(),
            code.name()
        ),
        None => tracing::info!(
            reading_id = reading.id,
            "Condition indeterminate (temperature or delta unavailable)"
        ),
    }
}

//! Latest snapshot per live source
//!
//! Each source overwrites only its own slot. Readers always get a copy, so a
//! reader never observes a half-updated snapshot.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{SensorSnapshot, SkySnapshot, StationSnapshot};
use crate::types::SourceKind;

/// A snapshot with the time it reached us
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    pub snapshot: T,
    pub received_at: DateTime<Utc>,
}

/// Copy of both slots taken under one lock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestSnapshots {
    pub station: Option<Sample<StationSnapshot>>,
    pub sky: Option<Sample<SkySnapshot>>,
}

impl LatestSnapshots {
    pub fn fused(&self) -> SensorSnapshot {
        SensorSnapshot::fuse(
            self.station.as_ref().map(|s| &s.snapshot),
            self.sky.as_ref().map(|s| &s.snapshot),
        )
    }
}

/// When each source last reported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLiveness {
    pub source: SourceKind,
    pub last_seen: Option<DateTime<Utc>>,
    pub age_s: Option<i64>,
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    latest: Mutex<LatestSnapshots>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_station(&self, snapshot: StationSnapshot, received_at: DateTime<Utc>) {
        self.lock().station = Some(Sample {
            snapshot,
            received_at,
        });
    }

    pub fn record_sky(&self, snapshot: SkySnapshot, received_at: DateTime<Utc>) {
        self.lock().sky = Some(Sample {
            snapshot,
            received_at,
        });
    }

    pub fn latest(&self) -> LatestSnapshots {
        self.lock().clone()
    }

    pub fn liveness(&self, now: DateTime<Utc>) -> Vec<SourceLiveness> {
        let latest = self.latest();
        let entry = |source, seen: Option<DateTime<Utc>>| SourceLiveness {
            source,
            last_seen: seen,
            age_s: seen.map(|t| (now - t).num_seconds().max(0)),
        };
        vec![
            entry(
                SourceKind::Station,
                latest.station.as_ref().map(|s| s.received_at),
            ),
            entry(SourceKind::Sky, latest.sky.as_ref().map(|s| s.received_at)),
        ]
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LatestSnapshots> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Common types used across the station

use serde::{Deserialize, Serialize};

/// The live inputs feeding a reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Station,
    Sky,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Station => "station",
            SourceKind::Sky => "sky",
        }
    }
}

/// Overall liveness reported by the status endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    Ok,
    Stale,
    NoData,
}

/// Look-back window for history queries, in hours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow(u32);

impl HistoryWindow {
    pub const DEFAULT_HOURS: u32 = 24;
    pub const MAX_HOURS: u32 = 168;

    /// Clamp a requested window into `1..=168`; absent means 24 hours.
    pub fn from_hours(hours: Option<i64>) -> Self {
        let hours = hours
            .map(|h| h.clamp(1, i64::from(Self::MAX_HOURS)) as u32)
            .unwrap_or(Self::DEFAULT_HOURS);
        Self(hours)
    }

    pub fn hours(&self) -> u32 {
        self.0
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.0))
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self(Self::DEFAULT_HOURS)
    }
}

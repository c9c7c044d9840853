//! Live threshold set backed by a JSON file
//!
//! Readers take an `Arc` snapshot and never wait on an apply. Applies are
//! serialized; each one copies the current file into the backup directory,
//! writes the new set to a temp file, fsyncs it and renames it over the live
//! file. Only after the rename does the in-memory snapshot change.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared::thresholds::{
    AppliedChange, RejectedChange, ThresholdChange, ThresholdSet, THRESHOLD_VOCABULARY_VERSION,
};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// A threshold set together with the revision of the file it came from
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdSnapshot {
    pub revision: String,
    pub vocabulary_version: u32,
    pub thresholds: ThresholdSet,
}

impl ThresholdSnapshot {
    fn from_bytes(bytes: &[u8], thresholds: ThresholdSet) -> Self {
        Self {
            revision: revision_of(bytes),
            vocabulary_version: THRESHOLD_VOCABULARY_VERSION,
            thresholds,
        }
    }
}

/// Outcome of an operator apply
#[derive(Debug, Clone, Serialize)]
pub struct ApplyResult {
    pub applied: Vec<AppliedChange>,
    pub rejected: Vec<RejectedChange>,
    /// Backup of the previous file; absent when nothing was accepted
    pub backup: Option<PathBuf>,
    pub revision: String,
}

pub struct ThresholdStore {
    path: PathBuf,
    backup_dir: PathBuf,
    current: RwLock<Arc<ThresholdSnapshot>>,
    apply_lock: Mutex<()>,
}

impl ThresholdStore {
    /// Load the live file, seeding it with defaults when it does not exist
    pub async fn open(path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let backup_dir = backup_dir.into();

        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let thresholds: ThresholdSet = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::Configuration(format!(
                        "Invalid threshold file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                ThresholdSnapshot::from_bytes(&bytes, thresholds)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Seeding {} with default thresholds", path.display());
                let thresholds = ThresholdSet::default();
                let bytes = encode(&thresholds)?;
                write_atomically(&path, &bytes).await.map_err(|e| {
                    AppError::Configuration(format!(
                        "Cannot create threshold file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                ThresholdSnapshot::from_bytes(&bytes, thresholds)
            }
            Err(e) => {
                return Err(AppError::Configuration(format!(
                    "Cannot read threshold file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::info!(
            "Thresholds loaded from {} (revision {})",
            path.display(),
            &snapshot.revision[..12]
        );

        Ok(Self {
            path,
            backup_dir,
            current: RwLock::new(Arc::new(snapshot)),
            apply_lock: Mutex::new(()),
        })
    }

    pub fn current(&self) -> Arc<ThresholdSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a batch of operator-approved changes.
    ///
    /// Rejected items are reported and do not stop their siblings. When
    /// nothing is accepted, no backup is taken and the file is untouched.
    pub async fn apply(&self, changes: &[ThresholdChange]) -> AppResult<ApplyResult> {
        let _guard = self.apply_lock.lock().await;

        let before = self.current();
        let outcome = before.thresholds.apply_changes(changes);

        if outcome.applied.is_empty() {
            tracing::info!(
                "Threshold apply accepted nothing ({} rejected)",
                outcome.rejected.len()
            );
            return Ok(ApplyResult {
                applied: Vec::new(),
                rejected: outcome.rejected,
                backup: None,
                revision: before.revision.clone(),
            });
        }

        let bytes = encode(&outcome.thresholds)?;
        let backup = self.backup(&before).await?;

        write_atomically(&self.path, &bytes).await.map_err(|e| {
            AppError::ApplyAborted(format!("writing {}: {}", self.path.display(), e))
        })?;

        let after = Arc::new(ThresholdSnapshot::from_bytes(&bytes, outcome.thresholds));
        let revision = after.revision.clone();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = after;

        tracing::info!(
            "Thresholds applied: {} changed, {} rejected, backup {}",
            outcome.applied.len(),
            outcome.rejected.len(),
            backup.display()
        );

        Ok(ApplyResult {
            applied: outcome.applied,
            rejected: outcome.rejected,
            backup: Some(backup),
            revision,
        })
    }

    /// Copy the live file, byte for byte, into the backup directory
    async fn backup(&self, before: &ThresholdSnapshot) -> AppResult<PathBuf> {
        let aborted = |e: std::io::Error| AppError::ApplyAborted(format!("backup failed: {}", e));

        let previous = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => encode(&before.thresholds)?,
            Err(e) => return Err(aborted(e)),
        };

        tokio::fs::create_dir_all(&self.backup_dir)
            .await
            .map_err(aborted)?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let mut attempt = 0u32;
        loop {
            let name = match attempt {
                0 => format!("thresholds-{}.json", stamp),
                n => format!("thresholds-{}-{}.json", stamp, n),
            };
            let target = self.backup_dir.join(name);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await
            {
                Ok(mut file) => {
                    file.write_all(&previous).await.map_err(aborted)?;
                    file.sync_all().await.map_err(aborted)?;
                    return Ok(target);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(aborted(e)),
            }
        }
    }
}

fn encode(thresholds: &ThresholdSet) -> AppResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(thresholds)
        .map_err(|e| AppError::Internal(format!("Cannot encode thresholds: {}", e)))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn revision_of(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Write `bytes` to a sibling temp file, fsync, then rename over `path`
async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let written = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if written.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    written
}

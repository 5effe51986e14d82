//! Personal best storage.
//!
//! [`RecordStore`] is the persistence seam of the plugin. [`InMemoryRecordStore`]
//! keeps everything in a [`DashMap`] keyed by map uid and can mirror itself to
//! a JSON snapshot file, written on [`RecordStore::flush`] and read back by
//! [`InMemoryRecordStore::open`].

use async_trait::async_trait;
use dashmap::DashMap;
use paddock_event_system::{current_timestamp, MapInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Record snapshot is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One player's best time on one map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub login: String,
    /// Race time in milliseconds
    pub time: i32,
    /// Unix time the record was set
    pub timestamp: u64,
}

/// Result of submitting a finish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// First finish of this player on the map
    New,
    /// Faster than the stored best, which is replaced
    Improved { previous: i32 },
    /// Equal or slower; nothing is stored
    NotImproved { best: i32 },
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn personal_best(&self, map_uid: &str, login: &str) -> Option<Record>;

    async fn submit(&self, map: &MapInfo, login: &str, time: i32) -> Result<Submission, RecordError>;

    /// Best records of a map, fastest first. Ties go to the earlier record.
    async fn top(&self, map_uid: &str, limit: usize) -> Vec<Record>;

    /// Persists pending changes, if the store persists anything.
    async fn flush(&self) -> Result<(), RecordError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MapRecords {
    name: String,
    records: HashMap<String, Record>,
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    maps: DashMap<String, MapRecords>,
    snapshot: Option<PathBuf>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store mirrored to `path`. An existing snapshot is loaded.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();

        let maps = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let stored: HashMap<String, MapRecords> = serde_json::from_slice(&bytes)?;
                info!(
                    "🏁 Loaded records for {} map(s) from {}",
                    stored.len(),
                    path.display()
                );
                stored.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No record snapshot at {}, starting empty", path.display());
                DashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            maps,
            snapshot: Some(path),
        })
    }

    pub fn map_count(&self) -> usize {
        self.maps.len()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn personal_best(&self, map_uid: &str, login: &str) -> Option<Record> {
        self.maps
            .get(map_uid)
            .and_then(|map| map.records.get(login).cloned())
    }

    async fn submit(&self, map: &MapInfo, login: &str, time: i32) -> Result<Submission, RecordError> {
        let mut entry = self.maps.entry(map.uid.clone()).or_default();
        entry.name.clone_from(&map.name);

        let submission = match entry.records.get(login) {
            None => Submission::New,
            Some(best) if time < best.time => Submission::Improved { previous: best.time },
            Some(best) => return Ok(Submission::NotImproved { best: best.time }),
        };

        entry.records.insert(
            login.to_string(),
            Record {
                login: login.to_string(),
                time,
                timestamp: current_timestamp(),
            },
        );
        Ok(submission)
    }

    async fn top(&self, map_uid: &str, limit: usize) -> Vec<Record> {
        let Some(map) = self.maps.get(map_uid) else {
            return Vec::new();
        };

        let mut records: Vec<Record> = map.records.values().cloned().collect();
        records.sort_by(|a, b| {
            a.time
                .cmp(&b.time)
                .then(a.timestamp.cmp(&b.timestamp))
                .then_with(|| a.login.cmp(&b.login))
        });
        records.truncate(limit);
        records
    }

    async fn flush(&self) -> Result<(), RecordError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let stored: HashMap<String, MapRecords> = self
            .maps
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let bytes = serde_json::to_vec_pretty(&stored)?;

        let staging = path.with_extension("tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, path).await?;

        info!(
            "💾 Saved records for {} map(s) to {}",
            stored.len(),
            path.display()
        );
        Ok(())
    }
}

// src/state.rs
//! Last-known item per source, persisted as one small JSON file per source id.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::config::WatchConfig;
use crate::error::StorageError;
use crate::ingest::types::LatestItem;

#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    /// `Ok(None)` only when no record exists yet.
    async fn load(&self, source_id: &str) -> Result<Option<LatestItem>, StorageError>;
    /// Replace the record; readers never see a half-written file.
    async fn save(&self, source_id: &str, item: &LatestItem) -> Result<(), StorageError>;
}

/// On-disk record. `recorded_at` is optional so bare `{title, link}` files load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredItem {
    title: String,
    link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorded_at: Option<DateTime<Utc>>,
}

/// `{dir}/{source_id}.json`, unless a source has its own file configured.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    overrides: HashMap<String, PathBuf>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overrides: HashMap::new(),
        }
    }

    pub fn with_file(mut self, source_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(source_id.into(), path.into());
        self
    }

    pub fn from_config(cfg: &WatchConfig) -> Self {
        cfg.sources
            .iter()
            .filter_map(|s| s.state_file.as_ref().map(|p| (s.id.clone(), p.clone())))
            .fold(Self::new(&cfg.state_dir), |store, (id, p)| {
                store.with_file(id, p)
            })
    }

    pub fn path_for(&self, source_id: &str) -> PathBuf {
        self.overrides
            .get(source_id)
            .cloned()
            .unwrap_or_else(|| self.dir.join(format!("{source_id}.json")))
    }
}

#[async_trait::async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self, source_id: &str) -> Result<Option<LatestItem>, StorageError> {
        let path = self.path_for(source_id);
        let content = match fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Read {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        let stored: StoredItem = serde_json::from_str(&content).map_err(|e| {
            StorageError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        if stored.title.is_empty() {
            return Err(StorageError::Corrupt {
                path,
                reason: "empty title".into(),
            });
        }
        Ok(Some(LatestItem {
            title: stored.title,
            link: stored.link,
        }))
    }

    async fn save(&self, source_id: &str, item: &LatestItem) -> Result<(), StorageError> {
        let path = self.path_for(source_id);
        let write_err = |e: std::io::Error| StorageError::Write {
            path: path.clone(),
            reason: e.to_string(),
        };

        let stored = StoredItem {
            title: item.title.clone(),
            link: item.link.clone(),
            recorded_at: Some(Utc::now()),
        };
        let json = serde_json::to_vec_pretty(&stored).map_err(|e| StorageError::Write {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let tmp = tmp_path(&path);
        fs::write(&tmp, json).await.map_err(write_err)?;
        fs::rename(&tmp, &path).await.map_err(write_err)?;

        tracing::debug!(source = source_id, path = %path.display(), "state saved");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

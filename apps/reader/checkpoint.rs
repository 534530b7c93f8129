use crate::error::{ReaderError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf, sync::Mutex};
use tracing::debug;

/// Where a source's pagination stands between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Checkpoint {
    #[default]
    Fresh,
    Resume {
        after: String,
    },
    Done,
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointRecord {
    #[serde(flatten)]
    checkpoint: Checkpoint,
    updated_at: DateTime<Utc>,
}

/// Persists continuation tokens so a later run can pick up where this one stopped.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self, source: &str) -> Result<Checkpoint>;
    async fn save(&self, source: &str, checkpoint: &Checkpoint) -> Result<()>;
}

/// One JSON file per source identifier inside `dir`.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, source: &str) -> PathBuf {
        self.dir.join(format!("{source}.json"))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self, source: &str) -> Result<Checkpoint> {
        let path = self.path_for(source);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Checkpoint::Fresh),
            Err(e) => return Err(ReaderError::io(path, e)),
        };

        let record: CheckpointRecord =
            serde_json::from_str(&contents).map_err(|e| ReaderError::Checkpoint {
                source_id: source.to_string(),
                reason: e.to_string(),
            })?;
        debug!(source, updated_at = %record.updated_at, "Loaded checkpoint");
        Ok(record.checkpoint)
    }

    async fn save(&self, source: &str, checkpoint: &Checkpoint) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ReaderError::io(&self.dir, e))?;

        let record = CheckpointRecord {
            checkpoint: checkpoint.clone(),
            updated_at: Utc::now(),
        };
        let contents = serde_json::to_string(&record).map_err(|e| ReaderError::Checkpoint {
            source_id: source.to_string(),
            reason: e.to_string(),
        })?;

        let path = self.path_for(source);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| ReaderError::io(path, e))
    }
}

/// In-process store, handy for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryTokenStore {
    checkpoints: Mutex<HashMap<String, Checkpoint>>,
}

impl MemoryTokenStore {
    pub fn with(source: &str, checkpoint: Checkpoint) -> Self {
        let store = Self::default();
        if let Ok(mut checkpoints) = store.checkpoints.lock() {
            checkpoints.insert(source.to_string(), checkpoint);
        }
        store
    }

    pub fn get(&self, source: &str) -> Checkpoint {
        self.checkpoints
            .lock()
            .ok()
            .and_then(|checkpoints| checkpoints.get(source).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self, source: &str) -> Result<Checkpoint> {
        Ok(self.get(source))
    }

    async fn save(&self, source: &str, checkpoint: &Checkpoint) -> Result<()> {
        let mut checkpoints = self
            .checkpoints
            .lock()
            .map_err(|e| ReaderError::Checkpoint {
                source_id: source.to_string(),
                reason: e.to_string(),
            })?;
        checkpoints.insert(source.to_string(), checkpoint.clone());
        Ok(())
    }
}

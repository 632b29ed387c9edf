//! Key-value persistence consumed by the session store and synced settings.
//!
//! Values are JSON documents keyed by string, mirroring the extension's
//! `storage.local` / `storage.sync` areas. Failures are reported as
//! [`anyhow::Error`]; callers wrap them into domain errors.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, future::Future, path::PathBuf, sync::Arc};

/// Asynchronous JSON key-value storage.
pub trait Storage: Clone + Send + Sync {
    /// Fetch the given keys. Missing keys are absent from the result.
    fn get(&self, keys: &[&str]) -> impl Future<Output = Result<Map<String, Value>>> + Send;

    /// Write every entry in `items`, replacing existing values.
    fn set(&self, items: Map<String, Value>) -> impl Future<Output = Result<()>> + Send;

    /// Delete the given keys. Missing keys are ignored.
    fn remove(&self, keys: &[&str]) -> impl Future<Output = Result<()>> + Send;
}

/// In-memory storage.
///
/// Useful for tests and as a scratch area; clones share the same entries.
#[derive(Clone, Default, Debug)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries.into_iter().collect())),
        }
    }

    /// Snapshot a single value.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let entries = self.entries.lock();
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| ((*k).to_owned(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        self.entries.lock().extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Storage persisted as a single JSON object on disk.
///
/// Every write rewrites the whole document. Writes go to a sibling
/// temporary file first and are renamed into place.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: Arc<PathBuf>,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl FileStorage {
    /// Open storage at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        let raw = match tokio::fs::read(self.path.as_path()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()));
            }
        };
        if raw.is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_slice(&raw)
            .with_context(|| format!("corrupt storage file {}", self.path.display()))
    }

    async fn store(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("tmp");
        let raw = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&tmp, raw)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, self.path.as_path())
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        tracing::trace!(path = %self.path.display(), keys = entries.len(), "storage flushed");
        Ok(())
    }
}

impl Storage for FileStorage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        Ok(keys
            .iter()
            .filter_map(|k| entries.remove(*k).map(|v| ((*k).to_owned(), v)))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.extend(items);
        self.store(&entries).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before {
            return Ok(());
        }
        self.store(&entries).await
    }
}

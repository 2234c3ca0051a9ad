use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{config, error::Result};

/// Durable string key-value storage backing the credential store.
///
/// Batch operations must be applied as a unit: a reader never observes half
/// of a `set_entries` or `remove_entries` call.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_entries(&self, entries: &[(&str, String)]) -> Result<()>;

    async fn remove_entries(&self, keys: &[&str]) -> Result<()>;
}

/// Entries kept as a single JSON object on disk.
pub struct FileStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// `songify/storage.json` in the local data directory.
    pub fn default_path() -> PathBuf {
        config::data_dir().join("storage.json")
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "storage file is corrupt, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set_entries(&self, entries: &[(&str, String)]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        for (key, value) in entries {
            all.insert(key.to_string(), value.clone());
        }
        self.write_all(&all).await
    }

    async fn remove_entries(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        let before = all.len();
        all.retain(|k, _| !keys.contains(&k.as_str()));
        if all.len() == before {
            return Ok(());
        }
        self.write_all(&all).await
    }
}

/// In-process store, used by tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set_entries(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut all = self.entries.lock();
        for (key, value) in entries {
            all.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    async fn remove_entries(&self, keys: &[&str]) -> Result<()> {
        self.entries
            .lock()
            .retain(|k, _| !keys.contains(&k.as_str()));
        Ok(())
    }
}

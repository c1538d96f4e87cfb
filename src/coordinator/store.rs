//! Persistence seam for the coordinator.
//!
//! Two namespaces: a durable one holding the global mode, and a session one
//! holding per-tab entries keyed by the stringified tab id. The mode is read
//! back raw so an unrecognized stored value can be told apart from a
//! missing one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::{CoordinatorState, Mode, TabEntry, TabId};
use crate::error::StoreError;

/// Async key-value store used by the driver.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Raw persisted mode value, if any.
    async fn get_mode(&self) -> Result<Option<String>, StoreError>;
    async fn set_mode(&self, mode: Mode) -> Result<(), StoreError>;
    async fn get_tab(&self, tab_id: TabId) -> Result<Option<TabEntry>, StoreError>;
    async fn put_tab(&self, tab_id: TabId, entry: &TabEntry) -> Result<(), StoreError>;
    async fn remove_tab(&self, tab_id: TabId) -> Result<(), StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn parse_tab_key(key: &str) -> Option<TabId> {
    key.parse().ok().map(TabId)
}

/// Session-scoped tab entries shared by both store implementations.
#[derive(Debug, Default)]
struct SessionTabs {
    entries: Mutex<BTreeMap<String, TabEntry>>,
}

impl SessionTabs {
    fn get(&self, tab_id: TabId) -> Option<TabEntry> {
        lock(&self.entries).get(&tab_id.key()).copied()
    }

    fn put(&self, tab_id: TabId, entry: TabEntry) {
        lock(&self.entries).insert(tab_id.key(), entry);
    }

    fn remove(&self, tab_id: TabId) {
        lock(&self.entries).remove(&tab_id.key());
    }

    fn snapshot(&self) -> BTreeMap<TabId, TabEntry> {
        lock(&self.entries)
            .iter()
            .filter_map(|(key, entry)| parse_tab_key(key).map(|id| (id, *entry)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    mode: Mutex<Option<String>>,
    tabs: SessionTabs,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the raw mode value, including values `Mode` cannot parse.
    pub fn with_raw_mode(raw: impl Into<String>) -> Self {
        let store = Self::default();
        *lock(&store.mode) = Some(raw.into());
        store
    }

    pub fn with_mode(mode: Mode) -> Self {
        Self::with_raw_mode(mode.as_str())
    }

    pub fn seed_tab(&self, tab_id: TabId, entry: TabEntry) {
        self.tabs.put(tab_id, entry);
    }

    pub fn snapshot(&self) -> CoordinatorState {
        CoordinatorState {
            mode: lock(&self.mode).as_deref().and_then(Mode::parse),
            tabs: self.tabs.snapshot(),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get_mode(&self) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.mode).clone())
    }

    async fn set_mode(&self, mode: Mode) -> Result<(), StoreError> {
        *lock(&self.mode) = Some(mode.as_str().to_string());
        Ok(())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Option<TabEntry>, StoreError> {
        Ok(self.tabs.get(tab_id))
    }

    async fn put_tab(&self, tab_id: TabId, entry: &TabEntry) -> Result<(), StoreError> {
        self.tabs.put(tab_id, *entry);
        Ok(())
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), StoreError> {
        self.tabs.remove(tab_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

const STATE_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
}

/// Durable mode in a JSON file, tab entries in memory for the session.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    tabs: SessionTabs,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tabs: SessionTabs::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tabs(&self) -> BTreeMap<TabId, TabEntry> {
        self.tabs.snapshot()
    }

    async fn read_state(&self) -> Result<Option<PersistedState>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state: PersistedState = serde_json::from_str(&raw)?;
        if state.version != STATE_FILE_VERSION {
            return Err(StoreError::Unavailable(format!(
                "unsupported state file version {} in {}",
                state.version,
                self.path.display()
            )));
        }
        Ok(Some(state))
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn get_mode(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read_state().await?.and_then(|s| s.mode))
    }

    async fn set_mode(&self, mode: Mode) -> Result<(), StoreError> {
        let payload = PersistedState {
            version: STATE_FILE_VERSION,
            mode: Some(mode.as_str().to_string()),
        };
        let json = serde_json::to_vec_pretty(&payload)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Sibling temp file, then rename over the target.
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        debug!(path = %self.path.display(), %mode, "persisted mode");
        Ok(())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Option<TabEntry>, StoreError> {
        Ok(self.tabs.get(tab_id))
    }

    async fn put_tab(&self, tab_id: TabId, entry: &TabEntry) -> Result<(), StoreError> {
        self.tabs.put(tab_id, *entry);
        Ok(())
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<(), StoreError> {
        self.tabs.remove(tab_id);
        Ok(())
    }
}

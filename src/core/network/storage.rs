/*!
Durable local storage for client state.

The extension keeps a handful of plain key-value entries between runs: the
cached shared API key and its fetch time, the sticky server, last-used-server
bookkeeping and the admin session. `LocalStore` persists them as one JSON
object, written atomically with the temp+rename pattern.

Absence of a key always reads as "not cached". An unparseable file reads as
empty; the next write replaces it.
*/

use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::types::ClientError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Every entry the client persists, keyed by its storage name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_api_key: Option<String>,
    /// Epoch millis when `cached_api_key` was fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_timestamp: Option<i64>,
    /// Sticky server mirror
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_server_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_server_use_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

enum Backend {
    File(PathBuf),
    Memory(Mutex<StoredState>),
}

/// Key-value store backing the sticky server, key cache and admin session
pub struct LocalStore {
    backend: Backend,
    corruption_reported: AtomicBool,
}

impl LocalStore {
    /// File-backed store; default path is `~/.kimaaka/storage.json`
    pub fn new(path: Option<PathBuf>) -> Result<Self, ClientError> {
        let path = match path {
            Some(path) => path,
            None => {
                let home = dirs::home_dir()
                    .ok_or_else(|| ClientError::Config("Home directory not found".to_string()))?;
                home.join(".kimaaka").join("storage.json")
            }
        };
        Ok(Self {
            backend: Backend::File(path),
            corruption_reported: AtomicBool::new(false),
        })
    }

    /// Store without a filesystem; state lives as long as the process
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(StoredState::default())),
            corruption_reported: AtomicBool::new(false),
        }
    }

    /// Whether an unparseable storage file has been seen (and logged)
    pub fn corruption_reported(&self) -> bool {
        self.corruption_reported.load(Ordering::Relaxed)
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match &self.backend {
            Backend::File(path) => Some(path),
            Backend::Memory(_) => None,
        }
    }

    /// Load the full record; missing or corrupt storage reads as empty
    pub async fn load(&self) -> StoredState {
        match &self.backend {
            Backend::Memory(state) => state.lock().map(|s| s.clone()).unwrap_or_default(),
            Backend::File(path) => {
                let content = match tokio::fs::read_to_string(path).await {
                    Ok(content) => content,
                    Err(_) => return StoredState::default(),
                };
                match serde_json::from_str::<StoredState>(&content) {
                    Ok(state) => state,
                    Err(e) => {
                        // Reported once per store
                        if !self.corruption_reported.swap(true, Ordering::Relaxed) {
                            get_debug_logger().error_sync(
                                "LocalStore",
                                "storage_corrupt",
                                &format!("Ignoring unparseable storage file: {}", e),
                            );
                        }
                        StoredState::default()
                    }
                }
            }
        }
    }

    /// Read-modify-write of the whole record
    ///
    /// The host is single-threaded cooperative, so no two updates interleave
    /// between the read and the atomic rename.
    pub async fn update<F>(&self, mutate: F) -> Result<StoredState, ClientError>
    where
        F: FnOnce(&mut StoredState),
    {
        match &self.backend {
            Backend::Memory(state) => {
                let mut guard = state
                    .lock()
                    .map_err(|_| ClientError::Storage("Memory store poisoned".to_string()))?;
                mutate(&mut guard);
                Ok(guard.clone())
            }
            Backend::File(path) => {
                let mut state = self.load().await;
                mutate(&mut state);
                write_state_atomic(path, &state).await?;
                Ok(state)
            }
        }
    }

    /// Remove every entry
    pub async fn clear(&self) -> Result<(), ClientError> {
        self.update(|state| *state = StoredState::default()).await?;
        Ok(())
    }
}

/// Write state atomically using temp file + rename
async fn write_state_atomic(path: &PathBuf, state: &StoredState) -> Result<(), ClientError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            ClientError::Storage(format!("Failed to create directory: {}", e))
        })?;
    }

    let temp_path = path.with_extension("tmp");
    let content = serde_json::to_string_pretty(state)
        .map_err(|e| ClientError::Storage(format!("Failed to serialize state: {}", e)))?;

    tokio::fs::write(&temp_path, content)
        .await
        .map_err(|e| ClientError::Storage(format!("Failed to write temp file: {}", e)))?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| ClientError::Storage(format!("Failed to rename temp file: {}", e)))?;

    Ok(())
}

use crate::core::network::clock::ClockTrait;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::storage::LocalStore;
use crate::core::network::types::ClientError;
use std::sync::Arc;

/// A cached shared API key and when it was fetched (epoch millis)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedKey {
    pub value: String,
    pub fetched_at: i64,
}

enum StoredEntry {
    Empty,
    Corrupt,
    Present(CachedKey),
}

/// TTL cache for the shared API key, backed by `LocalStore`
///
/// The two fields are always read and written together in one store update.
/// A stale entry is not deleted on read; the next `put` overwrites it. A
/// corrupt entry (one field without the other) is cleared when read.
pub struct KeyCache {
    store: Arc<LocalStore>,
    clock: Arc<dyn ClockTrait>,
    ttl_ms: i64,
}

impl KeyCache {
    pub fn new(store: Arc<LocalStore>, clock: Arc<dyn ClockTrait>, ttl_secs: u64) -> Self {
        Self {
            store,
            clock,
            ttl_ms: (ttl_secs as i64).saturating_mul(1000),
        }
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// The cached key if it is younger than the TTL
    pub async fn get(&self) -> Option<String> {
        let logger = get_debug_logger();
        let entry = match self.read().await {
            StoredEntry::Present(entry) => entry,
            StoredEntry::Empty => {
                logger.key_cache_event("miss", None);
                return None;
            }
            StoredEntry::Corrupt => {
                logger.key_cache_event("corrupt", None);
                if let Err(e) = self.clear().await {
                    logger.error_sync("KeyCache", "clear_failed", &e.to_string());
                }
                return None;
            }
        };

        let age = self.clock.now_millis() - entry.fetched_at;
        if age < self.ttl_ms {
            logger.key_cache_event("hit", Some(age));
            Some(entry.value)
        } else {
            logger.key_cache_event("expired", Some(age));
            None
        }
    }

    /// Raw entry regardless of age
    ///
    /// A key without a timestamp (or the reverse) counts as a corrupt entry
    /// and reads as absent.
    pub async fn entry(&self) -> Option<CachedKey> {
        match self.read().await {
            StoredEntry::Present(entry) => Some(entry),
            StoredEntry::Empty | StoredEntry::Corrupt => None,
        }
    }

    async fn read(&self) -> StoredEntry {
        let state = self.store.load().await;
        match (state.cached_api_key, state.key_timestamp) {
            (Some(value), Some(fetched_at)) if !value.is_empty() => {
                StoredEntry::Present(CachedKey { value, fetched_at })
            }
            (None, None) => StoredEntry::Empty,
            _ => StoredEntry::Corrupt,
        }
    }

    /// Store `key` fetched now, replacing any previous entry
    pub async fn put(&self, key: &str) -> Result<CachedKey, ClientError> {
        let entry = CachedKey {
            value: key.to_string(),
            fetched_at: self.clock.now_millis(),
        };
        let stored = entry.clone();
        self.store
            .update(move |state| {
                state.cached_api_key = Some(stored.value);
                state.key_timestamp = Some(stored.fetched_at);
            })
            .await?;
        get_debug_logger().key_cache_event("stored", Some(0));
        Ok(entry)
    }

    pub async fn clear(&self) -> Result<(), ClientError> {
        self.store
            .update(|state| {
                state.cached_api_key = None;
                state.key_timestamp = None;
            })
            .await?;
        get_debug_logger().key_cache_event("cleared", None);
        Ok(())
    }
}

//! Shared failover state
//!
//! One `FailoverContext` is owned by the client and shared (via `Arc`) by the
//! selector, the operation runner, the key service and the admin layer. It
//! holds the sticky server and the quarantine set behind short-lived locks;
//! no lock is ever held across an await point.

use crate::core::failover::quarantine::QuarantineSet;
use crate::core::failover::registry::ServerRegistry;
use crate::core::network::clock::ClockTrait;
use crate::core::network::debug_logger::get_debug_logger;
use crate::core::network::storage::LocalStore;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct FailoverContext {
    registry: ServerRegistry,
    store: Arc<LocalStore>,
    clock: Arc<dyn ClockTrait>,
    sticky: Mutex<Option<String>>,
    quarantine: Mutex<QuarantineSet>,
}

impl FailoverContext {
    /// Build the context and restore the sticky server from storage
    ///
    /// A persisted sticky that is no longer a configured candidate is ignored.
    pub async fn new(
        registry: ServerRegistry,
        store: Arc<LocalStore>,
        clock: Arc<dyn ClockTrait>,
        quarantine_reset_secs: u64,
    ) -> Self {
        let window_ms = (quarantine_reset_secs as i64).saturating_mul(1000);
        let quarantine = QuarantineSet::new(clock.now_millis(), window_ms);

        let persisted = store.load().await.working_server_url;
        let sticky = persisted.filter(|url| registry.contains(url));

        Self {
            registry,
            store,
            clock,
            sticky: Mutex::new(sticky),
            quarantine: Mutex::new(quarantine),
        }
    }

    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn ClockTrait> {
        &self.clock
    }

    fn sticky_guard(&self) -> MutexGuard<'_, Option<String>> {
        self.sticky.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn quarantine_guard(&self) -> MutexGuard<'_, QuarantineSet> {
        self.quarantine.lock().unwrap_or_else(|p| p.into_inner())
    }

    // ---- sticky server ----

    pub fn sticky(&self) -> Option<String> {
        self.sticky_guard().clone()
    }

    /// Set the sticky server in memory and mirror it to storage
    pub async fn set_sticky(&self, base_url: &str) {
        let changed = {
            let mut guard = self.sticky_guard();
            let changed = guard.as_deref() != Some(base_url);
            *guard = Some(base_url.to_string());
            changed
        };
        if changed {
            get_debug_logger().sticky_changed(Some(base_url));
        }
        self.persist_sticky(Some(base_url.to_string())).await;
    }

    pub async fn clear_sticky(&self) {
        let previous = self.sticky_guard().take();
        if previous.is_some() {
            get_debug_logger().sticky_changed(None);
        }
        self.persist_sticky(None).await;
    }

    /// Clear the sticky server only if it currently points at `base_url`
    pub async fn clear_sticky_if(&self, base_url: &str) -> bool {
        let cleared = {
            let mut guard = self.sticky_guard();
            if guard.as_deref() == Some(base_url) {
                *guard = None;
                true
            } else {
                false
            }
        };
        if cleared {
            get_debug_logger().sticky_changed(None);
            self.persist_sticky(None).await;
        }
        cleared
    }

    async fn persist_sticky(&self, value: Option<String>) {
        // The in-memory sticky stays authoritative if the mirror write fails
        if let Err(e) = self.store.update(|state| state.working_server_url = value).await {
            get_debug_logger().error_sync(
                "FailoverContext",
                "sticky_persist_failed",
                &e.to_string(),
            );
        }
    }

    // ---- quarantine ----

    /// Quarantine `base_url`; returns true if it was newly added
    pub fn quarantine(&self, base_url: &str) -> bool {
        let (added, count) = {
            let mut guard = self.quarantine_guard();
            let added = guard.insert(base_url);
            (added, guard.len())
        };
        if added {
            get_debug_logger().server_quarantined(base_url, count, self.registry.len());
        }
        added
    }

    pub fn is_quarantined(&self, base_url: &str) -> bool {
        self.quarantine_guard().contains(base_url)
    }

    /// Quarantined candidates in configuration order
    pub fn quarantined(&self) -> Vec<String> {
        self.quarantine_guard()
            .members_in_order(self.registry.list_candidates())
    }

    /// Non-quarantined candidates, applying the time-based reset first
    pub fn available_servers(&self) -> Vec<String> {
        let now = self.clock.now_millis();
        let (expired, pool) = {
            let mut guard = self.quarantine_guard();
            let expired = guard.reset_if_expired(now);
            (expired, guard.pool(self.registry.list_candidates()))
        };
        if let Some(cleared) = expired {
            get_debug_logger().quarantine_reset("window_elapsed", cleared);
        }
        pool
    }

    /// Clear the whole quarantine set; returns how many servers were released
    pub fn reset_quarantine(&self, reason: &str) -> usize {
        let now = self.clock.now_millis();
        let cleared = self.quarantine_guard().clear(now);
        get_debug_logger().quarantine_reset(reason, cleared);
        cleared
    }

    // ---- bookkeeping ----

    /// A server just served an operation: make it sticky and record last-used
    pub async fn record_success(&self, base_url: &str) {
        {
            let mut guard = self.sticky_guard();
            if guard.as_deref() != Some(base_url) {
                *guard = Some(base_url.to_string());
                get_debug_logger().sticky_changed(Some(base_url));
            }
        }

        let now = self.clock.now_millis();
        let index = self.registry.index_of(base_url);
        let url = base_url.to_string();
        let result = self
            .store
            .update(move |state| {
                state.working_server_url = Some(url.clone());
                state.last_used_server = Some(url);
                state.last_used_server_index = index;
                state.last_server_use_time = Some(now);
            })
            .await;
        if let Err(e) = result {
            get_debug_logger().error_sync("FailoverContext", "bookkeeping_failed", &e.to_string());
        }
    }

    /// Forget the sticky server and release every quarantined server
    pub async fn reset(&self) {
        self.reset_quarantine("manual_reset");
        self.clear_sticky().await;
    }
}

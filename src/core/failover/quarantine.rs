use std::collections::HashSet;

/// Temporarily excluded candidates
///
/// Advisory and self-healing: the whole set is dropped once the reset window
/// has elapsed since the last reset, or when the caller finds every candidate
/// excluded. A server is never excluded permanently.
#[derive(Debug, Clone)]
pub struct QuarantineSet {
    members: HashSet<String>,
    last_reset_at: i64,
    reset_window_ms: i64,
}

impl QuarantineSet {
    pub fn new(now_ms: i64, reset_window_ms: i64) -> Self {
        Self {
            members: HashSet::new(),
            last_reset_at: now_ms,
            reset_window_ms,
        }
    }

    /// Returns true if the server was not already quarantined
    pub fn insert(&mut self, base_url: &str) -> bool {
        self.members.insert(base_url.to_string())
    }

    pub fn contains(&self, base_url: &str) -> bool {
        self.members.contains(base_url)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn last_reset_at(&self) -> i64 {
        self.last_reset_at
    }

    /// Clear everything and restart the window; returns how many were cleared
    pub fn clear(&mut self, now_ms: i64) -> usize {
        let cleared = self.members.len();
        self.members.clear();
        self.last_reset_at = now_ms;
        cleared
    }

    /// Time-based recovery; `Some(cleared)` when the window had elapsed
    pub fn reset_if_expired(&mut self, now_ms: i64) -> Option<usize> {
        if now_ms - self.last_reset_at > self.reset_window_ms {
            Some(self.clear(now_ms))
        } else {
            None
        }
    }

    /// Candidates not currently quarantined, in candidate order
    pub fn pool(&self, candidates: &[String]) -> Vec<String> {
        candidates
            .iter()
            .filter(|c| !self.members.contains(c.as_str()))
            .cloned()
            .collect()
    }

    /// Quarantined candidates, in candidate order
    pub fn members_in_order(&self, candidates: &[String]) -> Vec<String> {
        candidates
            .iter()
            .filter(|c| self.members.contains(c.as_str()))
            .cloned()
            .collect()
    }
}

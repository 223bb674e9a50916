//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sync engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound on how long a mutation stays pending
    pub request_timeout_ms: u64,
    /// Capacity of the sync event channel
    pub notice_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 15_000,
            notice_capacity: 64,
        }
    }
}

impl SyncConfig {
    #[inline]
    #[must_use]
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_notice_capacity(mut self, capacity: usize) -> Self {
        self.notice_capacity = capacity;
        self
    }

    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

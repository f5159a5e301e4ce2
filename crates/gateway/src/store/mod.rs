// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key/value backends shared by the callback store and the tool credential
//! cache.
//!
//! The backend is picked once at startup ([`MemoryStore`] or [`FileStore`])
//! and passed as `Arc<dyn KeyValueStore>` to every component that needs it.

pub mod file;
pub mod memory;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Async key/value store with optional per-entry expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>>;

    /// Insert or overwrite `key`. `ttl = None` keeps the entry until it is
    /// overwritten or deleted.
    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> anyhow::Result<()>;

    async fn delete(&self, key: &str) -> anyhow::Result<()>;

    /// Atomically read and remove `key`. Two concurrent callers never both
    /// observe the same value.
    async fn take(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>>;
}

/// A stored value plus its absolute expiry (epoch millis, `None` = never).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<u64>,
}

impl Entry {
    pub fn new(value: serde_json::Value, ttl: Option<Duration>) -> Self {
        let expires_at_ms = ttl.map(|t| epoch_ms().saturating_add(t.as_millis() as u64));
        Self { value, expires_at_ms }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms.is_some_and(|at| at <= now_ms)
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

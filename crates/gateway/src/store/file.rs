// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable store: one JSON document on disk, rewritten atomically.
//!
//! Every operation re-reads the file so entries written by another gateway
//! process sharing the path become visible. Each read-modify-write cycle runs
//! under an exclusive `flock(2)` on a sibling `.lock` file, so gateways
//! sharing one path never interleave a `take` or lose a `set`. The in-process
//! mutex keeps tasks of one gateway from parking blocking threads on the lock.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use nix::fcntl::{Flock, FlockArg};
use tokio::sync::Mutex;

use super::{epoch_ms, Entry, KeyValueStore};

type Document = HashMap<String, Entry>;

pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) a store at `path`. Parent directories are
    /// created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    async fn ensure_parent(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Acquire the cross-process lock. Released when the guard drops.
    async fn flock(&self, arg: FlockArg) -> anyhow::Result<Flock<File>> {
        self.ensure_parent().await?;
        let path = self.lock_path();
        tokio::task::spawn_blocking(move || -> anyhow::Result<Flock<File>> {
            let file = OpenOptions::new().create(true).truncate(false).write(true).open(&path)?;
            Flock::lock(file, arg).map_err(|(_file, errno)| anyhow::anyhow!("flock failed: {errno}"))
        })
        .await?
    }

    async fn load(&self) -> anyhow::Result<Document> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Document::new());
        }
        let mut doc: Document = serde_json::from_str(&contents)?;
        let now = epoch_ms();
        doc.retain(|_, entry| !entry.is_expired(now));
        Ok(doc)
    }

    /// Write tmp + rename. The temp name is unique per PID and call so
    /// concurrent saves never share a partially written file.
    async fn save(&self, doc: &Document) -> anyhow::Result<()> {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        self.ensure_parent().await?;
        let json = serde_json::to_string_pretty(doc)?;
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = self.path.with_file_name(tmp_name);
        let written = match tokio::fs::write(&tmp_path, json).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
        let _guard = self.lock.lock().await;
        let _flock = self.flock(FlockArg::LockShared).await?;
        Ok(self.load().await?.remove(key).map(|e| e.value))
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let _flock = self.flock(FlockArg::LockExclusive).await?;
        let mut doc = self.load().await?;
        doc.insert(key.to_owned(), Entry::new(value, ttl));
        self.save(&doc).await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let _flock = self.flock(FlockArg::LockExclusive).await?;
        let mut doc = self.load().await?;
        if doc.remove(key).is_some() {
            self.save(&doc).await?;
        }
        Ok(())
    }

    async fn take(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
        let _guard = self.lock.lock().await;
        let _flock = self.flock(FlockArg::LockExclusive).await?;
        let mut doc = self.load().await?;
        let Some(entry) = doc.remove(key) else {
            return Ok(None);
        };
        self.save(&doc).await?;
        Ok(Some(entry.value))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;

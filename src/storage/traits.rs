//! Storage trait definitions.
//!
//! These traits define the interface for storage backends, so backends can be
//! swapped without changing the minting service.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Setting, UsageState};
use crate::engine::{Pid, PidLookup};
use crate::error::StorageResult;

/// Persistence of the current minting setting.
#[async_trait]
pub trait SettingStorage: Send + Sync {
    /// Load the current setting, if one was ever saved.
    async fn get_setting(&self) -> StorageResult<Option<Setting>>;

    /// Replace the current setting.
    async fn save_setting(&self, setting: &Setting) -> StorageResult<()>;
}

/// Persistence of per-configuration usage records.
#[async_trait]
pub trait UsageStorage: Send + Sync {
    /// Load the usage record for a usage key.
    async fn get_usage(&self, key: &str) -> StorageResult<Option<UsageState>>;

    /// Save a usage record.
    ///
    /// Fails with `ConcurrentModification` unless `usage.version` is newer than
    /// the stored version.
    async fn save_usage(&self, usage: &UsageState) -> StorageResult<()>;

    /// List every usage record.
    async fn list_usage(&self) -> StorageResult<Vec<UsageState>>;
}

/// Record of every identifier ever issued.
///
/// The synchronous [`PidLookup`] answers from an in-memory index; call
/// [`refresh_index`](PidStorage::refresh_index) before minting to pick up
/// identifiers recorded by other processes.
#[async_trait]
pub trait PidStorage: PidLookup + Send + Sync {
    /// Durably mark a batch as issued.
    async fn record_pids(&self, pids: &[Pid]) -> StorageResult<()>;

    /// Number of distinct identifiers issued.
    async fn issued_count(&self) -> StorageResult<u64>;

    /// Bring the in-memory index up to date with durable storage.
    async fn refresh_index(&self) -> StorageResult<()>;
}

/// Distributed lock operations.
///
/// Serializes mint calls per configuration across workers.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Acquire a lock, waiting for a bounded time.
    ///
    /// # Arguments
    ///
    /// * `key` - Lock key/name
    /// * `ttl` - Time-to-live recorded with the lock
    ///
    /// # Returns
    ///
    /// A `LockGuard` that releases the lock when dropped.
    async fn acquire(&self, key: &str, ttl: Duration) -> StorageResult<LockGuard>;

    /// Try to acquire a lock without waiting.
    ///
    /// Returns `None` if the lock is already held.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> StorageResult<Option<LockGuard>>;

    /// Check if a lock is currently held.
    async fn is_locked(&self, key: &str) -> StorageResult<bool>;
}

type ReleaseFn = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// RAII guard for distributed locks.
///
/// The lock is released when the guard is dropped; prefer
/// [`release`](LockGuard::release) to release it deterministically.
pub struct LockGuard {
    key: String,
    release_fn: Option<ReleaseFn>,
}

impl LockGuard {
    /// Create a new lock guard.
    pub fn new<F, Fut>(key: String, release_fn: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            key,
            release_fn: Some(Box::new(move || Box::pin(release_fn()))),
        }
    }

    /// Get the lock key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Release the lock now.
    pub async fn release(mut self) {
        if let Some(release_fn) = self.release_fn.take() {
            release_fn().await;
        }
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("key", &self.key).finish()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release_fn) = self.release_fn.take() {
            tokio::spawn(async move {
                release_fn().await;
            });
        }
    }
}

/// Combined storage trait for all storage operations.
#[async_trait]
pub trait Storage: SettingStorage + UsageStorage + PidStorage + DistributedLock {
    /// Check if the storage backend is healthy and reachable.
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend name.
    fn backend_name(&self) -> &'static str;
}

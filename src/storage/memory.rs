//! In-process storage backend.
//!
//! Nothing survives a restart. Used by tests and throwaway deployments.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::domain::{Setting, UsageState};
use crate::engine::{Pid, PidLookup};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{
    DistributedLock, LockGuard, PidStorage, SettingStorage, Storage, UsageStorage,
};

/// How long `acquire` waits before giving up.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Memory-backed storage.
#[derive(Default)]
pub struct MemoryStorage {
    setting: RwLock<Option<Setting>>,
    usage: DashMap<String, UsageState>,
    pids: DashSet<String>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(key.to_string()).or_default().value())
    }
}

#[async_trait]
impl SettingStorage for MemoryStorage {
    async fn get_setting(&self) -> StorageResult<Option<Setting>> {
        Ok(self.setting.read().clone())
    }

    async fn save_setting(&self, setting: &Setting) -> StorageResult<()> {
        *self.setting.write() = Some(setting.clone());
        Ok(())
    }
}

#[async_trait]
impl UsageStorage for MemoryStorage {
    async fn get_usage(&self, key: &str) -> StorageResult<Option<UsageState>> {
        Ok(self.usage.get(key).map(|entry| entry.value().clone()))
    }

    async fn save_usage(&self, usage: &UsageState) -> StorageResult<()> {
        match self.usage.entry(usage.key.clone()) {
            Entry::Occupied(mut stored) => {
                if stored.get().version >= usage.version {
                    return Err(StorageError::ConcurrentModification);
                }
                stored.insert(usage.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(usage.clone());
            }
        }
        Ok(())
    }

    async fn list_usage(&self) -> StorageResult<Vec<UsageState>> {
        let mut all: Vec<UsageState> = self.usage.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(all)
    }
}

impl PidLookup for MemoryStorage {
    fn is_issued(&self, pid: &str) -> bool {
        self.pids.contains(pid)
    }
}

#[async_trait]
impl PidStorage for MemoryStorage {
    async fn record_pids(&self, pids: &[Pid]) -> StorageResult<()> {
        for pid in pids {
            self.pids.insert(pid.as_str().to_string());
        }
        Ok(())
    }

    async fn issued_count(&self) -> StorageResult<u64> {
        Ok(self.pids.len() as u64)
    }

    async fn refresh_index(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[async_trait]
impl DistributedLock for MemoryStorage {
    async fn acquire(&self, key: &str, _ttl: Duration) -> StorageResult<LockGuard> {
        let mutex = self.lock_for(key);
        let guard = tokio::time::timeout(ACQUIRE_TIMEOUT, mutex.lock_owned())
            .await
            .map_err(|_| StorageError::LockTimeout(format!("Failed to acquire lock '{key}'")))?;

        Ok(LockGuard::new(key.to_string(), move || async move {
            drop(guard);
        }))
    }

    async fn try_acquire(&self, key: &str, _ttl: Duration) -> StorageResult<Option<LockGuard>> {
        let Ok(guard) = self.lock_for(key).try_lock_owned() else {
            return Ok(None);
        };

        Ok(Some(LockGuard::new(key.to_string(), move || async move {
            drop(guard);
        })))
    }

    async fn is_locked(&self, key: &str) -> StorageResult<bool> {
        Ok(self
            .locks
            .get(key)
            .is_some_and(|mutex| mutex.try_lock().is_err()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

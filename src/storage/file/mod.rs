//! File-based storage backend.
//!
//! Stores settings and usage as JSON and issued identifiers as an append-only
//! log, with file locking for cross-process coordination. Suitable for
//! development and single-node deployments.
//!
//! Directory structure:
//! ```text
//! data/
//! ├── settings/
//! │   └── current.json
//! ├── usage/
//! │   └── usage.json
//! ├── pids/
//! │   └── issued.log
//! └── locks/
//!     └── {key}.lock
//! ```

mod lock;
mod pids;
mod setting;
mod usage;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::FileStorageConfig;
use crate::domain::{Setting, UsageState};
use crate::engine::{Pid, PidLookup};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{
    DistributedLock, LockGuard, PidStorage, SettingStorage, Storage, UsageStorage,
};

pub use lock::FileLock;
pub use pids::FilePidStorage;
pub use setting::FileSettingStorage;
pub use usage::FileUsageStorage;

/// File-based storage implementation.
pub struct FileStorage {
    /// Base data directory.
    base_dir: PathBuf,
    /// Current setting.
    setting_storage: FileSettingStorage,
    /// Usage records.
    usage_storage: FileUsageStorage,
    /// Issued identifier log.
    pid_storage: FilePidStorage,
    /// Lock manager.
    lock_manager: FileLock,
}

impl FileStorage {
    /// Create a new file storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directories cannot be created or the issued
    /// identifier log cannot be read.
    pub fn new(config: &FileStorageConfig) -> StorageResult<Self> {
        let base_dir = config.data_dir.clone();

        Self::ensure_directories(&base_dir)?;

        Ok(Self {
            setting_storage: FileSettingStorage::new(base_dir.join("settings")),
            usage_storage: FileUsageStorage::new(base_dir.join("usage")),
            pid_storage: FilePidStorage::open(base_dir.join("pids"))?,
            lock_manager: FileLock::new(base_dir.join("locks")),
            base_dir,
        })
    }

    fn ensure_directories(base_dir: &Path) -> StorageResult<()> {
        for dir in ["", "settings", "usage", "pids", "locks"] {
            let dir = base_dir.join(dir);
            std::fs::create_dir_all(&dir).map_err(|e| {
                StorageError::FileIO(format!("Failed to create directory {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl SettingStorage for FileStorage {
    async fn get_setting(&self) -> StorageResult<Option<Setting>> {
        self.setting_storage.get_setting().await
    }

    async fn save_setting(&self, setting: &Setting) -> StorageResult<()> {
        self.setting_storage.save_setting(setting).await
    }
}

#[async_trait]
impl UsageStorage for FileStorage {
    async fn get_usage(&self, key: &str) -> StorageResult<Option<UsageState>> {
        self.usage_storage.get_usage(key).await
    }

    async fn save_usage(&self, usage: &UsageState) -> StorageResult<()> {
        self.usage_storage.save_usage(usage).await
    }

    async fn list_usage(&self) -> StorageResult<Vec<UsageState>> {
        self.usage_storage.list_usage().await
    }
}

impl PidLookup for FileStorage {
    fn is_issued(&self, pid: &str) -> bool {
        self.pid_storage.is_issued(pid)
    }
}

#[async_trait]
impl PidStorage for FileStorage {
    async fn record_pids(&self, pids: &[Pid]) -> StorageResult<()> {
        self.pid_storage.record_pids(pids).await
    }

    async fn issued_count(&self) -> StorageResult<u64> {
        self.pid_storage.issued_count().await
    }

    async fn refresh_index(&self) -> StorageResult<()> {
        self.pid_storage.refresh_index().await
    }
}

#[async_trait]
impl DistributedLock for FileStorage {
    async fn acquire(&self, key: &str, ttl: Duration) -> StorageResult<LockGuard> {
        self.lock_manager.acquire(key, ttl).await
    }

    async fn try_acquire(&self, key: &str, ttl: Duration) -> StorageResult<Option<LockGuard>> {
        self.lock_manager.try_acquire(key, ttl).await
    }

    async fn is_locked(&self, key: &str) -> StorageResult<bool> {
        self.lock_manager.is_locked(key).await
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn health_check(&self) -> StorageResult<()> {
        if !self.base_dir.exists() {
            return Err(StorageError::Unavailable);
        }

        let test_file = self.base_dir.join(".health_check");
        tokio::fs::write(&test_file, b"ok")
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check failed: {e}")))?;
        tokio::fs::remove_file(&test_file)
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check cleanup failed: {e}")))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

//! File-based distributed locking.
//!
//! Uses file locks (flock) for coordination between processes. Lock files are
//! left in place on release: removing them would let a waiter lock an unlinked
//! inode while a newcomer locks a fresh file under the same name.
//! File locks may not work correctly on network filesystems.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fs2::FileExt;
use parking_lot::Mutex;
use tokio::time::sleep;

use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{DistributedLock, LockGuard};

const MAX_ATTEMPTS: u32 = 100;
const RETRY_DELAY: Duration = Duration::from_millis(50);

type ActiveLocks = Arc<Mutex<HashMap<String, std::fs::File>>>;

/// File-based lock manager.
pub struct FileLock {
    /// Directory for lock files.
    locks_dir: PathBuf,
    /// Open handles of locks held by this process.
    active_locks: ActiveLocks,
}

impl FileLock {
    /// Create a new file lock manager.
    #[must_use]
    pub fn new(locks_dir: PathBuf) -> Self {
        Self {
            locks_dir,
            active_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.locks_dir.join(format!("{}.lock", sanitize_name(key)))
    }

    /// Try once to take the lock. Returns `false` if it is held elsewhere.
    fn try_lock_file(&self, key: &str, ttl: Duration) -> StorageResult<bool> {
        if self.active_locks.lock().contains_key(key) {
            return Ok(false);
        }

        std::fs::create_dir_all(&self.locks_dir)?;

        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path(key))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                use std::io::Write;
                file.set_len(0)?;
                let mut file_ref = &file;
                writeln!(
                    file_ref,
                    "{{\"pid\":{},\"key\":{},\"acquired_at\":{},\"ttl_ms\":{}}}",
                    std::process::id(),
                    serde_json::Value::from(key),
                    chrono::Utc::now().timestamp_millis(),
                    ttl.as_millis()
                )
                .ok();

                self.active_locks.lock().insert(key.to_string(), file);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(StorageError::LockFailed(e.to_string())),
        }
    }

    fn guard(&self, key: &str) -> LockGuard {
        let active_locks = Arc::clone(&self.active_locks);
        let key_for_release = key.to_string();

        LockGuard::new(key.to_string(), move || async move {
            if let Some(file) = active_locks.lock().remove(&key_for_release) {
                let _ = file.unlock();
            }
        })
    }
}

#[async_trait]
impl DistributedLock for FileLock {
    async fn acquire(&self, key: &str, ttl: Duration) -> StorageResult<LockGuard> {
        for attempt in 0..MAX_ATTEMPTS {
            if self.try_lock_file(key, ttl)? {
                return Ok(self.guard(key));
            }

            if attempt < MAX_ATTEMPTS - 1 {
                sleep(RETRY_DELAY).await;
            }
        }

        Err(StorageError::LockTimeout(format!(
            "Failed to acquire lock '{key}' after {MAX_ATTEMPTS} attempts"
        )))
    }

    async fn try_acquire(&self, key: &str, ttl: Duration) -> StorageResult<Option<LockGuard>> {
        if self.try_lock_file(key, ttl)? {
            Ok(Some(self.guard(key)))
        } else {
            Ok(None)
        }
    }

    async fn is_locked(&self, key: &str) -> StorageResult<bool> {
        if self.active_locks.lock().contains_key(key) {
            return Ok(true);
        }

        let Ok(file) = std::fs::File::open(self.lock_path(key)) else {
            return Ok(false);
        };

        match file.try_lock_exclusive() {
            Ok(()) => {
                let _ = file.unlock();
                Ok(false)
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(true),
            Err(_) => Ok(false),
        }
    }
}

/// Sanitize a name for use as a filename.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

//! File-based usage storage.
//!
//! All usage records live in one JSON object keyed by usage key; usage keys
//! may contain any character of a prefix, so they are not used as file names.

use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use fs2::FileExt;
use tokio::sync::Mutex;

use crate::domain::UsageState;
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::UsageStorage;

type UsageMap = BTreeMap<String, UsageState>;

/// Stores usage records in `usage.json`.
pub struct FileUsageStorage {
    /// Directory holding the usage file.
    usage_dir: PathBuf,
    /// Mutex for coordinating file operations within this process.
    lock: Mutex<()>,
}

impl FileUsageStorage {
    /// Create a new file usage storage.
    #[must_use]
    pub fn new(usage_dir: PathBuf) -> Self {
        Self {
            usage_dir,
            lock: Mutex::new(()),
        }
    }

    fn usage_path(&self) -> PathBuf {
        self.usage_dir.join("usage.json")
    }

    fn parse(contents: &str) -> StorageResult<UsageMap> {
        if contents.trim().is_empty() {
            return Ok(UsageMap::new());
        }
        Ok(serde_json::from_str(contents)?)
    }

    fn read_all(&self) -> StorageResult<UsageMap> {
        let path = self.usage_path();

        if !path.exists() {
            return Ok(UsageMap::new());
        }

        let mut file = std::fs::File::open(&path)?;
        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let mut contents = String::new();
        let read = file.read_to_string(&mut contents);
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;
        read?;

        Self::parse(&contents)
    }

    fn rewrite<F>(file: &mut std::fs::File, update_fn: F) -> StorageResult<()>
    where
        F: FnOnce(&mut UsageMap) -> StorageResult<()>,
    {
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let mut usage = Self::parse(&contents)?;

        update_fn(&mut usage)?;

        let json = serde_json::to_string_pretty(&usage)?;
        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Read-modify-write the usage map under an exclusive file lock.
    fn update_all<F>(&self, update_fn: F) -> StorageResult<()>
    where
        F: FnOnce(&mut UsageMap) -> StorageResult<()>,
    {
        std::fs::create_dir_all(&self.usage_dir)?;

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.usage_path())?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let result = Self::rewrite(&mut file, update_fn);

        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        result
    }
}

#[async_trait]
impl UsageStorage for FileUsageStorage {
    async fn get_usage(&self, key: &str) -> StorageResult<Option<UsageState>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all()?.remove(key))
    }

    async fn save_usage(&self, usage: &UsageState) -> StorageResult<()> {
        let _guard = self.lock.lock().await;

        self.update_all(|all| {
            if let Some(stored) = all.get(&usage.key)
                && stored.version >= usage.version
            {
                return Err(StorageError::ConcurrentModification);
            }
            all.insert(usage.key.clone(), usage.clone());
            Ok(())
        })
    }

    async fn list_usage(&self) -> StorageResult<Vec<UsageState>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all()?.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (FileUsageStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileUsageStorage::new(temp_dir.path().join("usage"));
        (storage, temp_dir)
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.get_usage("a|sv|d").await.unwrap().is_none());

        let mut usage = UsageState::new("a|sv|d");
        usage.record_mint(3, Some(3));
        storage.save_usage(&usage).await.unwrap();

        let loaded = storage.get_usage("a|sv|d").await.unwrap().unwrap();
        assert_eq!(loaded.ordinal, 3);
        assert_eq!(loaded.issued, 3);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let (storage, _temp) = create_test_storage();

        let mut usage = UsageState::new("k");
        usage.record_mint(1, Some(1));
        storage.save_usage(&usage).await.unwrap();

        let stale = usage.clone();
        usage.record_mint(1, Some(2));
        storage.save_usage(&usage).await.unwrap();

        assert!(matches!(
            storage.save_usage(&stale).await,
            Err(StorageError::ConcurrentModification)
        ));
    }

    #[tokio::test]
    async fn test_list_usage() {
        let (storage, _temp) = create_test_storage();
        for key in ["b", "a"] {
            let mut usage = UsageState::new(key);
            usage.record_mint(1, None);
            storage.save_usage(&usage).await.unwrap();
        }

        let keys: Vec<String> = storage
            .list_usage()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.key)
            .collect();
        assert_eq!(keys, ["a", "b"]);
    }
}

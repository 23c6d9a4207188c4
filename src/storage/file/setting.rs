//! File-based setting storage.

use std::path::PathBuf;

use async_trait::async_trait;
use fs2::FileExt;
use tokio::sync::Mutex;

use crate::domain::Setting;
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::SettingStorage;

/// Stores the current setting as `current.json`.
pub struct FileSettingStorage {
    /// Directory holding the setting file.
    settings_dir: PathBuf,
    /// Mutex for coordinating file operations within this process.
    lock: Mutex<()>,
}

impl FileSettingStorage {
    /// Create a new file setting storage.
    #[must_use]
    pub fn new(settings_dir: PathBuf) -> Self {
        Self {
            settings_dir,
            lock: Mutex::new(()),
        }
    }

    fn setting_path(&self) -> PathBuf {
        self.settings_dir.join("current.json")
    }

    fn write_locked(&self, setting: &Setting) -> StorageResult<()> {
        std::fs::create_dir_all(&self.settings_dir)?;

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.setting_path())?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        serde_json::to_writer_pretty(&file, setting)?;
        file.sync_all()?;
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        Ok(())
    }

    fn read_locked(&self) -> StorageResult<Option<Setting>> {
        let path = self.setting_path();

        if !path.exists() {
            return Ok(None);
        }

        let file = std::fs::File::open(&path)?;
        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let setting: Setting = serde_json::from_reader(&file)?;
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        Ok(Some(setting))
    }
}

#[async_trait]
impl SettingStorage for FileSettingStorage {
    async fn get_setting(&self) -> StorageResult<Option<Setting>> {
        let _guard = self.lock.lock().await;
        self.read_locked()
    }

    async fn save_setting(&self, setting: &Setting) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        self.write_locked(setting)
    }
}

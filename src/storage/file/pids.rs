//! File-based issued identifier log.
//!
//! Identifiers are appended to `issued.log`, one per line. Lookups are served
//! from an in-memory index that tails the log from the last byte it consumed,
//! so identifiers appended by other processes become visible after a refresh.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashSet;
use fs2::FileExt;
use tokio::sync::Mutex;

use crate::engine::{Pid, PidLookup};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::PidStorage;

/// Append-only issued identifier log with an in-memory index.
pub struct FilePidStorage {
    /// Path of the log file.
    log_path: PathBuf,
    /// Every identifier seen so far.
    index: DashSet<String>,
    /// Bytes of the log already folded into the index.
    offset: parking_lot::Mutex<u64>,
    /// Mutex for coordinating file operations within this process.
    lock: Mutex<()>,
}

impl FilePidStorage {
    /// Open the log under `pids_dir`, loading every identifier already recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the log cannot be read.
    pub fn open(pids_dir: PathBuf) -> StorageResult<Self> {
        std::fs::create_dir_all(&pids_dir)?;

        let storage = Self {
            log_path: pids_dir.join("issued.log"),
            index: DashSet::new(),
            offset: parking_lot::Mutex::new(0),
            lock: Mutex::new(()),
        };
        let loaded = storage.tail_log()?;
        tracing::debug!(path = ?storage.log_path, loaded, "Loaded issued identifier log");

        Ok(storage)
    }

    /// Fold complete lines appended since the last call into the index.
    fn tail_log(&self) -> StorageResult<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let mut offset = self.offset.lock();
        let mut file = std::fs::File::open(&self.log_path)?;
        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let mut appended = Vec::new();
        let read = file
            .seek(SeekFrom::Start(*offset))
            .and_then(|_| file.read_to_end(&mut appended));
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;
        read?;

        // A line without its terminator is still being written.
        let complete = appended
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);

        let mut added = 0;
        for line in appended[..complete].split(|&b| b == b'\n') {
            if line.is_empty() {
                continue;
            }
            match std::str::from_utf8(line) {
                Ok(literal) => {
                    if self.index.insert(literal.to_string()) {
                        added += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = ?self.log_path,
                        error = %e,
                        "Skipping issued log line that is not UTF-8"
                    );
                }
            }
        }
        *offset += complete as u64;

        Ok(added)
    }

    fn append_locked(&self, pids: &[Pid]) -> StorageResult<()> {
        let mut lines = String::with_capacity(pids.iter().map(|p| p.as_str().len() + 1).sum());
        for pid in pids {
            lines.push_str(pid.as_str());
            lines.push('\n');
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let mut offset = self.offset.lock();
        let written = write_batch(&mut file, lines.as_bytes());
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;
        let (start, end) = written?;

        // Skip our own lines on the next tail unless someone else appended
        // since the last one.
        if start == *offset {
            *offset = end;
        }

        Ok(())
    }
}

/// Append `bytes` and return the byte range they occupy.
fn write_batch(file: &mut std::fs::File, bytes: &[u8]) -> std::io::Result<(u64, u64)> {
    let start = file.metadata()?.len();
    file.write_all(bytes)?;
    file.sync_data()?;
    Ok((start, start + bytes.len() as u64))
}

impl PidLookup for FilePidStorage {
    fn is_issued(&self, pid: &str) -> bool {
        self.index.contains(pid)
    }
}

#[async_trait]
impl PidStorage for FilePidStorage {
    async fn record_pids(&self, pids: &[Pid]) -> StorageResult<()> {
        if pids.is_empty() {
            return Ok(());
        }

        let _guard = self.lock.lock().await;
        self.append_locked(pids)?;
        for pid in pids {
            self.index.insert(pid.as_str().to_string());
        }
        Ok(())
    }

    async fn issued_count(&self) -> StorageResult<u64> {
        self.refresh_index().await?;
        Ok(self.index.len() as u64)
    }

    async fn refresh_index(&self) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let added = self.tail_log()?;
        if added > 0 {
            tracing::debug!(added, "Picked up identifiers from issued log");
        }
        Ok(())
    }
}

//! Storage backend factory.
//!
//! Creates the appropriate storage backend based on configuration.

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::AppError;
use crate::storage::file::FileStorage;
use crate::storage::memory::MemoryStorage;
use crate::storage::traits::Storage;

/// Create a storage backend based on configuration.
///
/// # Errors
///
/// Returns an error if the storage backend cannot be initialized or fails its
/// health check.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>, AppError> {
    let storage: Arc<dyn Storage> = match config.backend {
        StorageBackend::File => Arc::new(FileStorage::new(&config.file)?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    };

    storage.health_check().await?;
    tracing::info!(backend = storage.backend_name(), "Storage backend ready");

    Ok(storage)
}

//! Storage layer module.
//!
//! Trait-based storage abstraction so backends can be swapped without touching
//! the minting service.

pub mod factory;
pub mod file;
pub mod memory;
pub mod traits;

pub use factory::create_storage;
pub use memory::MemoryStorage;
pub use traits::{
    DistributedLock, LockGuard, PidStorage, SettingStorage, Storage, UsageStorage,
};

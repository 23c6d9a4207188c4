//! Service layer module.
//!
//! Business logic between the HTTP surface and storage.

pub mod minter;

pub use minter::MinterService;

//! Request handlers.

pub mod health;
pub mod mint;
pub mod settings;

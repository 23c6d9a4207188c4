//! Configuration management module.
//!
//! Supports loading configuration from:
//! - TOML files (config/default.toml, config/{profile}.toml)
//! - Environment variables with `PID_MINTER__<SECTION>__<KEY>` pattern

mod server;
mod storage;

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use server::ServerConfig;
pub use storage::{FileStorageConfig, StorageBackend, StorageConfig};

use crate::domain::Setting;
use crate::engine::RetryPolicy;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Minting configuration.
    #[serde(default)]
    pub minter: MinterConfig,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{MINTER_PROFILE}.toml` (if `MINTER_PROFILE` is set)
    /// 3. Environment variables with `PID_MINTER__` prefix
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let profile =
            std::env::var("MINTER_PROFILE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{profile}")).required(false))
            // PID_MINTER__SERVER__PORT=8080 -> server.port = 8080
            .add_source(
                Environment::with_prefix("PID_MINTER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("server.port cannot be 0".to_string()));
        }

        self.storage.validate()?;
        self.minter.validate()?;

        if self.auth.admin_token.is_empty() {
            return Err(ConfigError::Message(
                "auth.admin_token cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Minting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MinterConfig {
    /// Largest amount a single mint call may request.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: i64,

    /// Multiplier on expected draws per random slot.
    #[serde(default = "default_random_retry_factor")]
    pub random_retry_factor: u64,

    /// Time-to-live of the per-configuration mint lock, in seconds.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,

    /// Setting persisted the first time the service starts.
    #[serde(default)]
    pub default_setting: Setting,
}

const fn default_max_batch_size() -> i64 {
    1000
}

const fn default_random_retry_factor() -> u64 {
    64
}

const fn default_lock_ttl_secs() -> u64 {
    30
}

impl MinterConfig {
    /// Retry policy for the random minter.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_factor(self.random_retry_factor)
    }

    /// Lock time-to-live.
    #[must_use]
    pub const fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size <= 0 {
            return Err(ConfigError::Message(
                "minter.max_batch_size must be positive".to_string(),
            ));
        }
        if self.random_retry_factor == 0 {
            return Err(ConfigError::Message(
                "minter.random_retry_factor cannot be 0".to_string(),
            ));
        }
        self.default_setting
            .validate()
            .map_err(|e| ConfigError::Message(format!("minter.default_setting: {e}")))
    }
}

impl Default for MinterConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            random_retry_factor: default_random_retry_factor(),
            lock_ttl_secs: default_lock_ttl_secs(),
            default_setting: Setting::default(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Admin token for setting management APIs.
    #[serde(default = "default_admin_token")]
    pub admin_token: String,
}

fn default_admin_token() -> String {
    "admin_change_me_in_production".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_token: default_admin_token(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Enable Prometheus metrics endpoint.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

const fn default_metrics_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

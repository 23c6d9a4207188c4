//! Minting service.
//!
//! Wires the engine to storage: resolves settings, serializes mints per
//! configuration, and persists issued identifiers and usage after success.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::MinterConfig;
use crate::domain::{CapacityReport, ResolvedSetting, Setting, UsageState};
use crate::engine::{Capacity, MintBatch, MintError, Minter, RetryPolicy};
use crate::error::{AppError, Result};
use crate::storage::{DistributedLock, PidStorage, SettingStorage, Storage, UsageStorage};

/// Lock taken by every mint after its usage key lock. Usage keys always
/// contain `|`, so this name never collides with one.
const ISSUANCE_LOCK: &str = "issuance";

/// Service for minting identifiers under a setting.
pub struct MinterService {
    /// Storage backend.
    storage: Arc<dyn Storage>,
    /// Setting persisted when none exists yet.
    default_setting: Setting,
    /// Largest amount accepted per call.
    max_batch_size: i64,
    /// Random minter retry policy.
    retry: RetryPolicy,
    /// Per-configuration lock time-to-live.
    lock_ttl: Duration,
}

impl MinterService {
    /// Create a new minter service.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, config: &MinterConfig) -> Self {
        Self {
            storage,
            default_setting: config.default_setting.clone(),
            max_batch_size: config.max_batch_size,
            retry: config.retry_policy(),
            lock_ttl: config.lock_ttl(),
        }
    }

    /// Current setting, seeding storage with the configured default on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn current_setting(&self) -> Result<Setting> {
        if let Some(setting) = self.storage.get_setting().await? {
            return Ok(setting);
        }

        self.storage.save_setting(&self.default_setting).await?;
        tracing::info!("Seeded current setting from configuration");
        Ok(self.default_setting.clone())
    }

    /// Validate and persist a new current setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting is invalid or storage fails.
    pub async fn update_setting(&self, setting: Setting) -> Result<Setting> {
        setting.validate().map_err(AppError::InvalidSetting)?;
        self.storage.save_setting(&setting).await?;

        tracing::info!(
            prefix = %setting.prefix,
            auto = setting.auto,
            random = setting.random,
            "Current setting updated"
        );
        Ok(setting)
    }

    /// Mint `amount` identifiers under `setting`.
    ///
    /// Zero or negative amounts mint nothing and persist nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting is invalid, the amount exceeds the batch
    /// limit or the remaining capacity, or storage fails. Nothing is persisted
    /// when minting fails.
    pub async fn mint(&self, amount: i64, setting: &Setting) -> Result<MintBatch> {
        if amount > self.max_batch_size {
            return Err(AppError::BadRequest(format!(
                "amount cannot exceed {}",
                self.max_batch_size
            )));
        }
        let resolved = self.resolve(setting)?;
        let mode = resolved.mode;
        let started = Instant::now();

        let result = self.mint_serialized(amount, &resolved).await;

        metrics::histogram!("minter_mint_duration_seconds", "mode" => mode.as_str())
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(batch) => {
                metrics::counter!("minter_pids_minted_total", "mode" => mode.as_str())
                    .increment(batch.pids.len() as u64);
                tracing::info!(
                    usage_key = %resolved.usage_key,
                    mode = %mode,
                    minted = batch.pids.len(),
                    ordinal = ?batch.next_ordinal,
                    "Minted identifiers"
                );
            }
            Err(e) => {
                metrics::counter!("minter_mint_failures_total", "reason" => failure_reason(e))
                    .increment(1);
                tracing::warn!(
                    usage_key = %resolved.usage_key,
                    mode = %mode,
                    amount,
                    error = %e,
                    "Mint failed"
                );
            }
        }

        result
    }

    /// Hold the usage key lock, then the issuance lock, for the whole mint.
    ///
    /// Configurations with different usage keys can still render the same
    /// literal (prefix `a` with two digits, prefix `a0` with one), so the
    /// lookup, the engine run and the record step are serialized across keys.
    async fn mint_serialized(&self, amount: i64, resolved: &ResolvedSetting) -> Result<MintBatch> {
        let key_guard = self
            .storage
            .acquire(&resolved.usage_key, self.lock_ttl)
            .await?;
        let issuance_guard = match self.storage.acquire(ISSUANCE_LOCK, self.lock_ttl).await {
            Ok(guard) => guard,
            Err(e) => {
                key_guard.release().await;
                return Err(e.into());
            }
        };

        let result = self.mint_locked(amount, resolved).await;

        issuance_guard.release().await;
        key_guard.release().await;
        result
    }

    async fn mint_locked(&self, amount: i64, resolved: &ResolvedSetting) -> Result<MintBatch> {
        self.storage.refresh_index().await?;
        let mut usage = self.load_usage(&resolved.usage_key).await?;

        let batch = Minter::new(&resolved.config, self.storage.as_ref())
            .with_retry_policy(self.retry)
            .mint(resolved.mode, amount, usage.consumed(resolved.mode))?;

        if batch.pids.is_empty() {
            return Ok(batch);
        }

        // Identifiers first: a crash before the usage save can only make the
        // next sequential mint roll past them.
        self.storage.record_pids(&batch.pids).await?;
        usage.record_mint(batch.pids.len(), batch.next_ordinal);
        self.storage.save_usage(&usage).await?;

        Ok(batch)
    }

    /// Capacity left under `setting` for its minting mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting is invalid or storage fails.
    pub async fn capacity(&self, setting: &Setting) -> Result<CapacityReport> {
        let resolved = self.resolve(setting)?;
        let usage = self.load_usage(&resolved.usage_key).await?;
        let consumed = usage.consumed(resolved.mode);

        Ok(CapacityReport::new(
            resolved.usage_key,
            Capacity::of(&resolved.config, consumed),
            consumed,
        ))
    }

    /// Move the sequential resume point of `setting` past an existing identifier.
    ///
    /// Returns the resume point after the update; it never moves backwards.
    ///
    /// # Errors
    ///
    /// Returns a decode error if `pid` does not belong to the setting, or an
    /// error if storage fails.
    pub async fn resume_after(&self, setting: &Setting, pid: &str) -> Result<u64> {
        let resolved = self.resolve(setting)?;
        let ordinal = resolved
            .config
            .parse(pid)?
            .to_ordinal()
            .and_then(|ordinal| ordinal.checked_add(1))
            .ok_or(MintError::ArithmeticOverflow)?;

        let guard = self
            .storage
            .acquire(&resolved.usage_key, self.lock_ttl)
            .await?;
        let result = self.advance_locked(&resolved.usage_key, ordinal).await;
        guard.release().await;

        let resumed = result?;
        tracing::info!(
            usage_key = %resolved.usage_key,
            pid,
            ordinal = resumed,
            "Sequential resume point updated"
        );
        Ok(resumed)
    }

    async fn advance_locked(&self, key: &str, ordinal: u64) -> Result<u64> {
        let mut usage = self.load_usage(key).await?;
        if usage.advance_to(ordinal) {
            self.storage.save_usage(&usage).await?;
        }
        Ok(usage.ordinal)
    }

    /// Every usage record known to storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn usage_records(&self) -> Result<Vec<UsageState>> {
        Ok(self.storage.list_usage().await?)
    }

    fn resolve(&self, setting: &Setting) -> Result<ResolvedSetting> {
        setting.validate().map_err(AppError::InvalidSetting)?;
        Ok(setting.resolve()?)
    }

    async fn load_usage(&self, key: &str) -> Result<UsageState> {
        Ok(self
            .storage
            .get_usage(key)
            .await?
            .unwrap_or_else(|| UsageState::new(key)))
    }
}

fn failure_reason(err: &AppError) -> &'static str {
    match err {
        AppError::Mint(e) => e.reason(),
        AppError::InvalidSetting(_) | AppError::BadRequest(_) => "invalid_request",
        AppError::Storage(_) => "storage",
        _ => "internal",
    }
}

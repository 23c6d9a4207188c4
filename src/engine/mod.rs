//! Identifier minting engine.
//!
//! Pure computation: given an [`IdentifierConfig`], a consumed count and a
//! [`PidLookup`], produce a batch of distinct, previously unissued identifiers.
//! The engine never persists anything; callers record the batch and the new
//! ordinal after a successful mint, and serialize calls per configuration.

pub mod alphabet;
pub mod codec;
mod error;
pub mod identifier;
pub mod permutation;
pub mod random;
pub mod sequential;

use std::collections::{BTreeSet, HashSet};
use std::hash::BuildHasher;

use dashmap::DashSet;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use alphabet::{Layout, PositionSpec, TokenType};
pub use codec::CounterState;
pub use error::MintError;
pub use identifier::{IdentifierConfig, Pid};
pub use permutation::Capacity;
pub use random::RetryPolicy;
pub use sequential::SequentialBatch;

/// Answers whether a literal identifier has already been issued.
///
/// Must reflect every identifier committed before the mint call began.
pub trait PidLookup {
    /// True if `pid` has been issued by any configuration.
    fn is_issued(&self, pid: &str) -> bool;
}

impl<T: PidLookup + ?Sized> PidLookup for &T {
    fn is_issued(&self, pid: &str) -> bool {
        (**self).is_issued(pid)
    }
}

impl<S: BuildHasher> PidLookup for HashSet<String, S> {
    fn is_issued(&self, pid: &str) -> bool {
        self.contains(pid)
    }
}

impl PidLookup for BTreeSet<String> {
    fn is_issued(&self, pid: &str) -> bool {
        self.contains(pid)
    }
}

impl<S: BuildHasher + Clone> PidLookup for DashSet<String, S> {
    fn is_issued(&self, pid: &str) -> bool {
        self.contains(pid)
    }
}

/// Order in which identifiers are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MintMode {
    /// Counter-driven, canonical order.
    Sequential,
    /// Uniform sampling, no order.
    Random,
}

impl MintMode {
    /// Metric/log label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
        }
    }
}

impl std::fmt::Display for MintMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers produced by one mint call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintBatch {
    /// Minted identifiers; ordered only in sequential mode.
    pub pids: Vec<Pid>,
    /// New consumed ordinal. `None` in random mode.
    pub next_ordinal: Option<u64>,
}

impl From<SequentialBatch> for MintBatch {
    fn from(batch: SequentialBatch) -> Self {
        Self {
            pids: batch.pids,
            next_ordinal: Some(batch.next_ordinal),
        }
    }
}

/// Binds a configuration to an issued-identifier lookup.
#[derive(Debug)]
pub struct Minter<'a, L: ?Sized> {
    config: &'a IdentifierConfig,
    lookup: &'a L,
    retry: RetryPolicy,
}

impl<'a, L: PidLookup + ?Sized> Minter<'a, L> {
    /// Create a minter with the default retry policy.
    #[must_use]
    pub fn new(config: &'a IdentifierConfig, lookup: &'a L) -> Self {
        Self {
            config,
            lookup,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the random minter's retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Capacity left after `consumed` identifiers.
    #[must_use]
    pub fn capacity(&self, consumed: u64) -> Capacity {
        Capacity::of(self.config, consumed)
    }

    /// Mint in canonical order starting at ordinal `consumed`.
    ///
    /// # Errors
    ///
    /// See [`sequential::mint`].
    pub fn sequential(&self, requested: i64, consumed: u64) -> Result<SequentialBatch, MintError> {
        sequential::mint(self.config, self.lookup, requested, consumed)
    }

    /// Mint by sampling with the thread-local generator.
    ///
    /// # Errors
    ///
    /// See [`random::mint`].
    pub fn random(&self, requested: i64, consumed: u64) -> Result<Vec<Pid>, MintError> {
        self.random_with(requested, consumed, &mut rand::rng())
    }

    /// Mint by sampling with a caller-supplied generator.
    ///
    /// # Errors
    ///
    /// See [`random::mint`].
    pub fn random_with<R: Rng + ?Sized>(
        &self,
        requested: i64,
        consumed: u64,
        rng: &mut R,
    ) -> Result<Vec<Pid>, MintError> {
        random::mint(self.config, self.lookup, requested, consumed, self.retry, rng)
    }

    /// Mint in the given mode.
    ///
    /// # Errors
    ///
    /// Propagates the selected minter's error.
    pub fn mint(&self, mode: MintMode, requested: i64, consumed: u64) -> Result<MintBatch, MintError> {
        match mode {
            MintMode::Sequential => self.sequential(requested, consumed).map(Into::into),
            MintMode::Random => Ok(MintBatch {
                pids: self.random(requested, consumed)?,
                next_ordinal: None,
            }),
        }
    }
}

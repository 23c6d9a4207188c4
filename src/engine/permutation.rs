//! Permutation accounting and the capacity guard.

use super::MintError;
use super::identifier::IdentifierConfig;

/// Total number of distinct roots a configuration can produce.
///
/// # Errors
///
/// Returns `ArithmeticOverflow` if the product of radices exceeds `u64`.
pub fn total(config: &IdentifierConfig) -> Result<u64, MintError> {
    config
        .positions()
        .iter()
        .try_fold(1u64, |acc, position| acc.checked_mul(position.radix() as u64))
        .ok_or(MintError::ArithmeticOverflow)
}

/// Permutations left after `consumed` have been used, floored at zero.
#[must_use]
pub const fn remaining(total: u64, consumed: u64) -> u64 {
    total.saturating_sub(consumed)
}

/// Capacity of a configuration given what was already consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Finite space.
    Bounded {
        /// Product of radices.
        total: u64,
        /// `total - consumed`, floored at zero.
        remaining: u64,
    },
    /// The product of radices overflowed; capacity is effectively unbounded.
    Unbounded,
}

impl Capacity {
    /// Compute the capacity of a configuration.
    #[must_use]
    pub fn of(config: &IdentifierConfig, consumed: u64) -> Self {
        match total(config) {
            Ok(total) => Self::Bounded {
                total,
                remaining: remaining(total, consumed),
            },
            Err(_) => Self::Unbounded,
        }
    }

    /// Total permutations, `None` when unbounded.
    #[must_use]
    pub const fn total(&self) -> Option<u64> {
        match self {
            Self::Bounded { total, .. } => Some(*total),
            Self::Unbounded => None,
        }
    }

    /// Remaining permutations, `None` when unbounded.
    #[must_use]
    pub const fn remaining(&self) -> Option<u64> {
        match self {
            Self::Bounded { remaining, .. } => Some(*remaining),
            Self::Unbounded => None,
        }
    }
}

/// Validate a requested amount against a capacity.
///
/// Returns the number of identifiers to mint; zero for non-positive requests.
///
/// # Errors
///
/// Returns `NotEnoughPermutations` if the request exceeds the remaining capacity.
pub fn check_capacity(capacity: Capacity, requested: i64) -> Result<usize, MintError> {
    let Ok(requested) = u64::try_from(requested) else {
        return Ok(0);
    };

    if let Capacity::Bounded { remaining, .. } = capacity
        && requested > remaining
    {
        return Err(MintError::NotEnoughPermutations {
            remaining,
            requested,
        });
    }

    usize::try_from(requested).map_err(|_| MintError::NotEnoughPermutations {
        remaining: capacity.remaining().unwrap_or(u64::MAX),
        requested,
    })
}

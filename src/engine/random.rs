//! Sampling-based minting with collision avoidance.

use std::collections::HashSet;

use rand::Rng;

use super::identifier::{IdentifierConfig, Pid};
use super::permutation::{Capacity, check_capacity};
use super::{MintError, PidLookup};

/// Per-slot retry budget for the random minter.
///
/// A slot may draw up to `max(floor, factor * ceil(total / free))` candidates,
/// where `free` is the number of identifiers still available when the slot starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Multiplier on the expected number of draws.
    pub factor: u64,
    /// Lower bound on draws per slot.
    pub floor: u64,
}

impl RetryPolicy {
    /// Policy with a custom factor and the default floor.
    #[must_use]
    pub const fn with_factor(factor: u64) -> Self {
        Self {
            factor,
            floor: Self::DEFAULT_FLOOR,
        }
    }

    const DEFAULT_FACTOR: u64 = 64;
    const DEFAULT_FLOOR: u64 = 64;

    fn budget(&self, capacity: Capacity, filled: usize) -> u64 {
        let expected = match capacity {
            Capacity::Bounded { total, remaining } => {
                let free = remaining.saturating_sub(filled as u64).max(1);
                total.div_ceil(free)
            }
            Capacity::Unbounded => 1,
        };
        self.factor.saturating_mul(expected).max(self.floor).max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            factor: Self::DEFAULT_FACTOR,
            floor: Self::DEFAULT_FLOOR,
        }
    }
}

/// Mint `requested` identifiers by uniform sampling.
///
/// `consumed` only feeds the capacity guard; random minting never advances an
/// ordinal. The result has no particular order.
///
/// # Errors
///
/// Returns `NotEnoughPermutations` if the request exceeds the remaining capacity,
/// or if a slot exhausts its retry budget. In the latter case `remaining` is the
/// number of identifiers accepted before giving up.
pub fn mint<L, R>(
    config: &IdentifierConfig,
    lookup: &L,
    requested: i64,
    consumed: u64,
    policy: RetryPolicy,
    rng: &mut R,
) -> Result<Vec<Pid>, MintError>
where
    L: PidLookup + ?Sized,
    R: Rng + ?Sized,
{
    let capacity = Capacity::of(config, consumed);
    let wanted = check_capacity(capacity, requested)?;

    let mut accepted: HashSet<Pid> = HashSet::with_capacity(wanted.min(1024));
    let mut pids = Vec::with_capacity(wanted.min(1024));
    let mut state = config.zero_state();

    while pids.len() < wanted {
        let budget = policy.budget(capacity, pids.len());
        let mut found = None;

        for _ in 0..budget {
            state.randomize(rng);
            let candidate = config.render(&state);
            if !accepted.contains(&candidate) && !lookup.is_issued(candidate.as_str()) {
                found = Some(candidate);
                break;
            }
        }

        let Some(pid) = found else {
            tracing::debug!(
                accepted = pids.len(),
                requested = wanted,
                budget,
                "Random retry budget exhausted"
            );
            return Err(MintError::NotEnoughPermutations {
                remaining: pids.len() as u64,
                requested: wanted as u64,
            });
        };

        accepted.insert(pid.clone());
        pids.push(pid);
    }

    Ok(pids)
}

//! Counter-driven minting in canonical order.

use super::identifier::{IdentifierConfig, Pid};
use super::permutation::{Capacity, check_capacity};
use super::{MintError, PidLookup};

/// Result of a sequential mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialBatch {
    /// Identifiers in strictly increasing canonical order.
    pub pids: Vec<Pid>,
    /// Ordinal to persist as the new consumed count.
    pub next_ordinal: u64,
}

/// Mint `requested` identifiers starting at ordinal `consumed`.
///
/// Candidates the lookup reports as issued are skipped; the counter still moves
/// past them, so the returned ordinal accounts for every examined state.
///
/// # Errors
///
/// Returns `NotEnoughPermutations` if the request exceeds the remaining capacity,
/// or if the space runs out while skipping issued identifiers. In the latter case
/// `remaining` is the number of identifiers that could be accepted.
pub fn mint<L>(
    config: &IdentifierConfig,
    lookup: &L,
    requested: i64,
    consumed: u64,
) -> Result<SequentialBatch, MintError>
where
    L: PidLookup + ?Sized,
{
    let wanted = check_capacity(Capacity::of(config, consumed), requested)?;
    if wanted == 0 {
        return Ok(SequentialBatch {
            pids: Vec::new(),
            next_ordinal: consumed,
        });
    }

    let exhausted = |accepted: usize| MintError::NotEnoughPermutations {
        remaining: accepted as u64,
        requested: wanted as u64,
    };

    let mut state = config.state_at(consumed).ok_or_else(|| exhausted(0))?;
    let mut pids = Vec::with_capacity(wanted.min(1024));
    let mut ordinal = consumed;

    loop {
        let pid = config.render(&state);
        ordinal = ordinal.saturating_add(1);

        if lookup.is_issued(pid.as_str()) {
            tracing::trace!(pid = %pid, "Skipping issued identifier");
        } else {
            pids.push(pid);
            if pids.len() == wanted {
                break;
            }
        }

        if !state.increment() {
            return Err(exhausted(pids.len()));
        }
    }

    Ok(SequentialBatch {
        pids,
        next_ordinal: ordinal,
    })
}

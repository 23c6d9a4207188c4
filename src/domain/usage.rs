//! Usage records: how much of a permutation space has been consumed.

use serde::{Deserialize, Serialize};

use crate::engine::MintMode;

/// Persistent consumption state of one permutation space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageState {
    /// Usage key of the configuration.
    pub key: String,

    /// Sequential resume point (next ordinal to examine).
    pub ordinal: u64,

    /// Identifiers minted under this configuration, in any mode.
    pub issued: u64,

    /// Version for optimistic locking.
    pub version: u64,

    /// Last update timestamp (milliseconds since epoch).
    pub updated_at: i64,
}

impl UsageState {
    /// Fresh record for a never-seen configuration.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ordinal: 0,
            issued: 0,
            version: 0,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Consumed count fed to the capacity guard for a mode.
    #[must_use]
    pub const fn consumed(&self, mode: MintMode) -> u64 {
        match mode {
            MintMode::Sequential => self.ordinal,
            MintMode::Random => self.issued,
        }
    }

    /// Account for a successful mint.
    pub fn record_mint(&mut self, count: usize, next_ordinal: Option<u64>) {
        if let Some(ordinal) = next_ordinal {
            self.ordinal = self.ordinal.max(ordinal);
        }
        self.issued = self.issued.saturating_add(count as u64);
        self.touch();
    }

    /// Move the sequential resume point forward. Never moves it backwards.
    ///
    /// Returns `true` if the ordinal changed.
    pub fn advance_to(&mut self, ordinal: u64) -> bool {
        if ordinal <= self.ordinal {
            return false;
        }
        self.ordinal = ordinal;
        self.touch();
        true
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumed_per_mode() {
        let mut usage = UsageState::new("k");
        usage.record_mint(3, Some(5));
        usage.record_mint(4, None);

        assert_eq!(usage.consumed(MintMode::Sequential), 5);
        assert_eq!(usage.consumed(MintMode::Random), 7);
        assert_eq!(usage.version, 2);
    }

    #[test]
    fn test_advance_never_rewinds() {
        let mut usage = UsageState::new("k");
        assert!(usage.advance_to(10));
        assert!(!usage.advance_to(4));
        assert!(!usage.advance_to(10));
        assert_eq!(usage.ordinal, 10);
        assert_eq!(usage.version, 1);
    }
}

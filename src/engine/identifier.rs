//! Identifier configuration and the literal `Pid` type.

use serde::{Deserialize, Serialize};

use super::MintError;
use super::alphabet::{Layout, PositionSpec};
use super::codec::{self, CounterState};

/// A minted identifier: prepend + prefix + encoded root.
///
/// Equality and ordering are those of the literal string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(String);

impl Pid {
    /// Wrap a literal identifier.
    #[must_use]
    pub const fn new(literal: String) -> Self {
        Self(literal)
    }

    /// Literal string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the literal string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Pid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Pid> for String {
    fn from(pid: Pid) -> Self {
        pid.0
    }
}

/// Immutable description of one permutation space plus its literal decorations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierConfig {
    positions: Vec<PositionSpec>,
    prefix: String,
    prepend: String,
}

impl IdentifierConfig {
    /// Resolve a configuration from a layout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the layout cannot be resolved.
    pub fn new(
        layout: &Layout,
        sans_vowel: bool,
        prefix: impl Into<String>,
        prepend: impl Into<String>,
    ) -> Result<Self, MintError> {
        Ok(Self {
            positions: layout.positions(sans_vowel)?,
            prefix: prefix.into(),
            prepend: prepend.into(),
        })
    }

    /// Ordered root positions.
    #[must_use]
    pub fn positions(&self) -> &[PositionSpec] {
        &self.positions
    }

    /// Number of root characters.
    #[must_use]
    pub fn root_length(&self) -> usize {
        self.positions.len()
    }

    /// Literal prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Literal prepend, emitted before the prefix.
    #[must_use]
    pub fn prepend(&self) -> &str {
        &self.prepend
    }

    /// First state in canonical order.
    #[must_use]
    pub fn zero_state(&self) -> CounterState {
        CounterState::zero(&self.positions)
    }

    /// State at an ordinal, or `None` past the end of the space.
    #[must_use]
    pub fn state_at(&self, ordinal: u64) -> Option<CounterState> {
        CounterState::from_ordinal(&self.positions, ordinal)
    }

    /// Encode a state as its root.
    #[must_use]
    pub fn encode(&self, state: &CounterState) -> String {
        codec::encode(&self.positions, state)
    }

    /// Render the full identifier for a state.
    #[must_use]
    pub fn render(&self, state: &CounterState) -> Pid {
        let root = self.encode(state);
        let mut literal =
            String::with_capacity(self.prepend.len() + self.prefix.len() + root.len());
        literal.push_str(&self.prepend);
        literal.push_str(&self.prefix);
        literal.push_str(&root);
        Pid(literal)
    }

    /// Decode a root string.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the root does not fit this configuration.
    pub fn decode(&self, root: &str) -> Result<CounterState, MintError> {
        codec::decode(&self.positions, root)
    }

    /// Decode a full identifier, stripping prepend and prefix first.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the decorations are missing or the root does not fit.
    pub fn parse(&self, pid: &str) -> Result<CounterState, MintError> {
        let root = pid
            .strip_prefix(self.prepend.as_str())
            .and_then(|rest| rest.strip_prefix(self.prefix.as_str()))
            .ok_or_else(|| {
                MintError::Decode(format!(
                    "'{pid}' does not start with '{}{}'",
                    self.prepend, self.prefix
                ))
            })?;
        self.decode(root)
    }
}

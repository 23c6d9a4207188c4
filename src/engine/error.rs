//! Minting engine error type.

/// Failure of a mint call or of one of the engine's derivations.
///
/// Every variant is a synchronous, non-retried failure. The random minter's
/// bounded collision retries are the only place the engine loops on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MintError {
    /// Malformed alphabet specification (unknown code, empty alphabet, zero length).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The permutation count does not fit in a `u64`.
    #[error("Permutation count exceeds representable range")]
    ArithmeticOverflow,

    /// The requested amount exceeds what the configuration can still produce.
    #[error("{requested} ids were requested but only {remaining} can be created using given format")]
    NotEnoughPermutations {
        /// Identifiers that could still be produced.
        remaining: u64,
        /// Identifiers that were asked for.
        requested: u64,
    },

    /// A literal identifier does not belong to the configuration it was decoded against.
    #[error("Cannot decode identifier: {0}")]
    Decode(String),
}

impl MintError {
    /// Short, stable label used for metrics and structured logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::ArithmeticOverflow => "arithmetic_overflow",
            Self::NotEnoughPermutations { .. } => "not_enough_permutations",
            Self::Decode(_) => "decode",
        }
    }
}

//! Mixed-radix counter states.
//!
//! A root of length `n` is a mixed-radix number with one digit per position.
//! The rightmost position is the least significant digit; incrementing walks
//! the permutation space in canonical order.

use rand::Rng;

use super::MintError;
use super::alphabet::PositionSpec;

/// One point in a configuration's permutation space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterState {
    digits: Vec<usize>,
    radices: Vec<usize>,
}

impl CounterState {
    /// The first state in canonical order (all digit indices zero).
    #[must_use]
    pub fn zero(positions: &[PositionSpec]) -> Self {
        Self {
            digits: vec![0; positions.len()],
            radices: positions.iter().map(PositionSpec::radix).collect(),
        }
    }

    /// The state at `ordinal` in canonical order.
    ///
    /// Returns `None` if the ordinal lies beyond the permutation space.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_ordinal(positions: &[PositionSpec], ordinal: u64) -> Option<Self> {
        let mut state = Self::zero(positions);
        let mut rest = ordinal;

        for (digit, radix) in state.digits.iter_mut().zip(&state.radices).rev() {
            let radix = *radix as u64;
            *digit = (rest % radix) as usize;
            rest /= radix;
        }

        (rest == 0).then_some(state)
    }

    /// Build a state from explicit digit indices.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the digit count or any index does not fit the positions.
    pub fn from_digits(positions: &[PositionSpec], digits: Vec<usize>) -> Result<Self, MintError> {
        if digits.len() != positions.len() {
            return Err(MintError::Decode(format!(
                "expected {} digits, got {}",
                positions.len(),
                digits.len()
            )));
        }

        for (i, (digit, position)) in digits.iter().zip(positions).enumerate() {
            if *digit >= position.radix() {
                return Err(MintError::Decode(format!(
                    "digit {digit} out of range at position {i} (radix {})",
                    position.radix()
                )));
            }
        }

        Ok(Self {
            digits,
            radices: positions.iter().map(PositionSpec::radix).collect(),
        })
    }

    /// Digit indices, most significant first.
    #[must_use]
    pub fn digits(&self) -> &[usize] {
        &self.digits
    }

    /// Ordinal of this state in canonical order.
    ///
    /// Returns `None` if the ordinal does not fit in a `u64`.
    #[must_use]
    pub fn to_ordinal(&self) -> Option<u64> {
        self.digits
            .iter()
            .zip(&self.radices)
            .try_fold(0u64, |acc, (digit, radix)| {
                acc.checked_mul(*radix as u64)?.checked_add(*digit as u64)
            })
    }

    /// Odometer increment.
    ///
    /// Returns `false`, leaving the state untouched, when every position is
    /// already at its last character and the carry would leave the first position.
    pub fn increment(&mut self) -> bool {
        let Some(pivot) = self
            .digits
            .iter()
            .zip(&self.radices)
            .rposition(|(digit, radix)| digit + 1 < *radix)
        else {
            return false;
        };

        self.digits[pivot] += 1;
        for digit in &mut self.digits[pivot + 1..] {
            *digit = 0;
        }
        true
    }

    /// Overwrite every digit with an independent uniform sample.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for (digit, radix) in self.digits.iter_mut().zip(&self.radices) {
            *digit = rng.random_range(0..*radix);
        }
    }
}

/// Encode a state as its root string.
#[must_use]
pub fn encode(positions: &[PositionSpec], state: &CounterState) -> String {
    positions
        .iter()
        .zip(state.digits())
        .map(|(position, digit)| position.char_at(*digit))
        .collect()
}

/// Decode a root string back into its state.
///
/// # Errors
///
/// Returns `Decode` if the length differs from the root length or a character
/// does not belong to its position's alphabet.
pub fn decode(positions: &[PositionSpec], root: &str) -> Result<CounterState, MintError> {
    let length = root.chars().count();
    if length != positions.len() {
        return Err(MintError::Decode(format!(
            "root '{root}' has length {length}, expected {}",
            positions.len()
        )));
    }

    let digits = root
        .chars()
        .zip(positions)
        .enumerate()
        .map(|(i, (c, position))| {
            position.index_of(c).ok_or_else(|| {
                MintError::Decode(format!(
                    "character '{c}' at position {i} is not in the {} alphabet",
                    position.class()
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    CounterState::from_digits(positions, digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::alphabet::{Layout, TokenType};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn positions(codes: &str, sans_vowel: bool) -> Vec<PositionSpec> {
        Layout::CharMap(codes.to_string())
            .positions(sans_vowel)
            .unwrap()
    }

    #[test]
    fn test_zero_state() {
        let positions = positions("dl", false);
        let state = CounterState::zero(&positions);
        assert_eq!(state.digits(), &[0, 0]);
        assert_eq!(encode(&positions, &state), "0a");
        assert_eq!(state.to_ordinal(), Some(0));
    }

    #[test]
    fn test_increment_carries_leftward() {
        let positions = positions("dd", false);
        let mut state = CounterState::from_ordinal(&positions, 9).unwrap();
        assert_eq!(encode(&positions, &state), "09");

        assert!(state.increment());
        assert_eq!(encode(&positions, &state), "10");
        assert_eq!(state.to_ordinal(), Some(10));
    }

    #[test]
    fn test_increment_stops_at_end_of_space() {
        let positions = positions("dd", false);
        let mut state = CounterState::from_ordinal(&positions, 99).unwrap();
        assert!(!state.increment());
        assert_eq!(encode(&positions, &state), "99");
    }

    #[test]
    fn test_exhaustive_enumeration_has_no_duplicates() {
        let positions = positions("dl", true);
        let total = 10 * 21;
        let mut state = CounterState::zero(&positions);
        let mut seen = HashSet::new();
        seen.insert(encode(&positions, &state));

        for call in 1..=total {
            let advanced = state.increment();
            if call == total {
                assert!(!advanced, "last increment must report exhaustion");
            } else {
                assert!(advanced);
                assert!(seen.insert(encode(&positions, &state)));
            }
        }
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn test_canonical_order_matches_string_order() {
        let positions = positions("em", false);
        let mut state = CounterState::zero(&positions);
        let mut prev = encode(&positions, &state);

        while state.increment() {
            let current = encode(&positions, &state);
            assert!(prev < current, "{prev} >= {current}");
            prev = current;
        }
    }

    #[test]
    fn test_from_ordinal_beyond_space() {
        let positions = positions("ddddd", false);
        assert!(CounterState::from_ordinal(&positions, 99_999).is_some());
        assert!(CounterState::from_ordinal(&positions, 100_000).is_none());
    }

    #[test]
    fn test_decode_errors() {
        let positions = positions("dl", true);
        assert!(matches!(
            decode(&positions, "0"),
            Err(MintError::Decode(_))
        ));
        assert!(matches!(
            decode(&positions, "0a"),
            Err(MintError::Decode(_))
        ));
        assert!(decode(&positions, "a0").is_err());
        assert_eq!(decode(&positions, "9z").unwrap().digits(), &[9, 20]);
    }

    #[test]
    fn test_from_digits_validates_range() {
        let positions = positions("dd", false);
        assert!(CounterState::from_digits(&positions, vec![1, 10]).is_err());
        assert!(CounterState::from_digits(&positions, vec![1]).is_err());
        assert!(CounterState::from_digits(&positions, vec![1, 9]).is_ok());
    }

    #[test]
    fn test_to_ordinal_overflow() {
        let layout = Layout::Uniform {
            token_type: TokenType::MixedExtended,
            root_length: 20,
        };
        let positions = layout.positions(false).unwrap();
        let mut state = CounterState::zero(&positions);
        assert_eq!(state.to_ordinal(), Some(0));

        state.digits[0] = 61;
        assert_eq!(state.to_ordinal(), None);
    }

    #[test]
    fn test_randomize_stays_in_range() {
        let positions = positions("dlume", true);
        let mut state = CounterState::zero(&positions);
        let mut rng = rand::rng();

        for _ in 0..200 {
            state.randomize(&mut rng);
            let root = encode(&positions, &state);
            assert_eq!(decode(&positions, &root).unwrap(), state);
        }
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            codes in "[dlume]{1,8}",
            sans_vowel in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let positions = positions(&codes, sans_vowel);
            let total: u64 = positions.iter().map(|p| p.radix() as u64).product();
            let state = CounterState::from_ordinal(&positions, seed % total).unwrap();

            let root = encode(&positions, &state);
            prop_assert_eq!(decode(&positions, &root).unwrap(), state);
        }

        #[test]
        fn prop_ordinal_round_trip(codes in "[dlume]{1,6}", seed in any::<u64>()) {
            let positions = positions(&codes, false);
            let total: u64 = positions.iter().map(|p| p.radix() as u64).product();
            let ordinal = seed % total;

            let state = CounterState::from_ordinal(&positions, ordinal).unwrap();
            prop_assert_eq!(state.to_ordinal(), Some(ordinal));
        }
    }
}

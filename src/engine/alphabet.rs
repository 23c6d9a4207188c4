//! Character classes and per-position alphabets.
//!
//! Alphabets are kept in ASCII order (digits, uppercase, lowercase) so that the
//! counter's canonical order and plain string order agree for roots of equal length.

use serde::{Deserialize, Serialize};

use super::MintError;

const DIGITS: &str = "0123456789";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";

/// Check whether a character is a vowel (either case).
const fn is_vowel(c: char) -> bool {
    matches!(
        c,
        'a' | 'e' | 'i' | 'o' | 'u' | 'A' | 'E' | 'I' | 'O' | 'U'
    )
}

/// Character class of a root position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    /// `0-9`.
    Digit,
    /// `a-z`.
    Lowercase,
    /// `A-Z`.
    Uppercase,
    /// `A-Z` and `a-z`.
    #[serde(rename = "MIXEDCASE")]
    MixedCase,
    /// `0-9` and `a-z`.
    LowerExtended,
    /// `0-9` and `A-Z`.
    UpperExtended,
    /// `0-9`, `A-Z` and `a-z`.
    MixedExtended,
}

impl TokenType {
    /// All token types, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Digit,
        Self::Lowercase,
        Self::Uppercase,
        Self::MixedCase,
        Self::LowerExtended,
        Self::UpperExtended,
        Self::MixedExtended,
    ];

    /// Resolve a single char-map code.
    ///
    /// Only `d`, `l`, `u`, `m` and `e` are valid in a char map.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'd' => Some(Self::Digit),
            'l' => Some(Self::Lowercase),
            'u' => Some(Self::Uppercase),
            'm' => Some(Self::MixedCase),
            'e' => Some(Self::MixedExtended),
            _ => None,
        }
    }

    /// Compact label used when building usage keys.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Digit => "d",
            Self::Lowercase => "l",
            Self::Uppercase => "u",
            Self::MixedCase => "m",
            Self::LowerExtended => "ld",
            Self::UpperExtended => "ud",
            Self::MixedExtended => "e",
        }
    }

    /// True if the alphabet depends on vowel exclusion.
    #[must_use]
    pub const fn has_letters(self) -> bool {
        !matches!(self, Self::Digit)
    }

    /// Build this class's ordered alphabet.
    #[must_use]
    pub fn alphabet(self, sans_vowel: bool) -> Vec<char> {
        let sources: &[&str] = match self {
            Self::Digit => &[DIGITS],
            Self::Lowercase => &[LOWERCASE],
            Self::Uppercase => &[UPPERCASE],
            Self::MixedCase => &[UPPERCASE, LOWERCASE],
            Self::LowerExtended => &[DIGITS, LOWERCASE],
            Self::UpperExtended => &[DIGITS, UPPERCASE],
            Self::MixedExtended => &[DIGITS, UPPERCASE, LOWERCASE],
        };

        sources
            .iter()
            .flat_map(|s| s.chars())
            .filter(|c| !(sans_vowel && is_vowel(*c)))
            .collect()
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Digit => write!(f, "DIGIT"),
            Self::Lowercase => write!(f, "LOWERCASE"),
            Self::Uppercase => write!(f, "UPPERCASE"),
            Self::MixedCase => write!(f, "MIXEDCASE"),
            Self::LowerExtended => write!(f, "LOWER_EXTENDED"),
            Self::UpperExtended => write!(f, "UPPER_EXTENDED"),
            Self::MixedExtended => write!(f, "MIXED_EXTENDED"),
        }
    }
}

/// One character position of a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSpec {
    class: TokenType,
    alphabet: Vec<char>,
}

impl PositionSpec {
    /// Derive a position from a class and the vowel flag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the resulting alphabet is empty.
    pub fn new(class: TokenType, sans_vowel: bool) -> Result<Self, MintError> {
        let alphabet = class.alphabet(sans_vowel);
        if alphabet.is_empty() {
            return Err(MintError::InvalidConfiguration(format!(
                "{class} yields an empty alphabet"
            )));
        }
        Ok(Self { class, alphabet })
    }

    /// Character class this position was derived from.
    #[must_use]
    pub const fn class(&self) -> TokenType {
        self.class
    }

    /// Ordered alphabet.
    #[must_use]
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Alphabet size. Always at least 1.
    #[must_use]
    pub fn radix(&self) -> usize {
        self.alphabet.len()
    }

    /// Character for a digit index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= radix()`; counter states never hold such indices.
    #[must_use]
    pub fn char_at(&self, index: usize) -> char {
        self.alphabet[index]
    }

    /// Digit index of a character, if it belongs to this position.
    #[must_use]
    pub fn index_of(&self, c: char) -> Option<usize> {
        self.alphabet.binary_search(&c).ok()
    }
}

/// How the position sequence of a configuration is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Every position uses the same token type.
    Uniform {
        /// Class of every position.
        token_type: TokenType,
        /// Number of positions.
        root_length: usize,
    },
    /// One char-map code per position, e.g. `"ddlu"`.
    CharMap(String),
}

impl Layout {
    /// Resolve the ordered position sequence.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for a zero root length, an empty char map,
    /// an unknown char-map code, or an empty alphabet.
    pub fn positions(&self, sans_vowel: bool) -> Result<Vec<PositionSpec>, MintError> {
        match self {
            Self::Uniform {
                token_type,
                root_length,
            } => {
                if *root_length == 0 {
                    return Err(MintError::InvalidConfiguration(
                        "root length must be at least 1".to_string(),
                    ));
                }
                let spec = PositionSpec::new(*token_type, sans_vowel)?;
                Ok(vec![spec; *root_length])
            }
            Self::CharMap(codes) => {
                if codes.is_empty() {
                    return Err(MintError::InvalidConfiguration(
                        "char map cannot be empty".to_string(),
                    ));
                }
                codes
                    .chars()
                    .map(|code| {
                        let class = TokenType::from_code(code).ok_or_else(|| {
                            MintError::InvalidConfiguration(format!(
                                "unknown char map code: '{code}'"
                            ))
                        })?;
                        PositionSpec::new(class, sans_vowel)
                    })
                    .collect()
            }
        }
    }
}

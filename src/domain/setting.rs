//! Minting settings.

use serde::{Deserialize, Serialize};

use crate::engine::{IdentifierConfig, Layout, MintError, MintMode, TokenType};

/// Longest root a setting may describe.
pub const MAX_ROOT_LENGTH: usize = 64;

/// Longest prefix or prepend accepted.
pub const MAX_DECORATION_LENGTH: usize = 255;

/// Caller-facing description of how identifiers are minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    /// Static marker emitted before the prefix, e.g. `ark:/`.
    #[serde(default)]
    pub prepend: String,

    /// Literal prefix of every root.
    #[serde(default)]
    pub prefix: String,

    /// Class of every position when `auto` is set.
    #[serde(default = "default_token_type")]
    pub token_type: TokenType,

    /// One code per position when `auto` is not set.
    #[serde(default = "default_char_map")]
    pub char_map: String,

    /// Number of positions when `auto` is set.
    #[serde(default = "default_root_length")]
    pub root_length: usize,

    /// Exclude vowels from letter classes.
    #[serde(default = "default_true")]
    pub sans_vowel: bool,

    /// Uniform token type (`true`) or explicit char map (`false`).
    #[serde(default = "default_true")]
    pub auto: bool,

    /// Random (`true`) or sequential (`false`) order.
    #[serde(default = "default_true")]
    pub random: bool,
}

const fn default_token_type() -> TokenType {
    TokenType::Digit
}

fn default_char_map() -> String {
    "ddddd".to_string()
}

const fn default_root_length() -> usize {
    5
}

const fn default_true() -> bool {
    true
}

impl Default for Setting {
    fn default() -> Self {
        Self {
            prepend: String::new(),
            prefix: String::new(),
            token_type: default_token_type(),
            char_map: default_char_map(),
            root_length: default_root_length(),
            sans_vowel: true,
            auto: true,
            random: true,
        }
    }
}

/// A setting resolved against the engine.
#[derive(Debug, Clone)]
pub struct ResolvedSetting {
    /// Engine configuration.
    pub config: IdentifierConfig,
    /// Key of the configuration's permutation space.
    pub usage_key: String,
    /// Minting order.
    pub mode: MintMode,
}

impl Setting {
    /// Validate the setting.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        // Issued identifiers are stored one per line.
        if self.prefix.chars().any(char::is_control) {
            return Err("prefix cannot contain control characters".to_string());
        }
        if self.prepend.chars().any(char::is_control) {
            return Err("prepend cannot contain control characters".to_string());
        }
        if self.prefix.len() > MAX_DECORATION_LENGTH {
            return Err(format!(
                "prefix cannot exceed {MAX_DECORATION_LENGTH} characters"
            ));
        }
        if self.prepend.len() > MAX_DECORATION_LENGTH {
            return Err(format!(
                "prepend cannot exceed {MAX_DECORATION_LENGTH} characters"
            ));
        }
        if self.auto && self.root_length > MAX_ROOT_LENGTH {
            return Err(format!("root_length cannot exceed {MAX_ROOT_LENGTH}"));
        }
        if !self.auto && self.char_map.chars().count() > MAX_ROOT_LENGTH {
            return Err(format!("char_map cannot exceed {MAX_ROOT_LENGTH} codes"));
        }
        self.resolve().map(|_| ()).map_err(|e| e.to_string())
    }

    /// Position layout described by this setting.
    #[must_use]
    pub fn layout(&self) -> Layout {
        if self.auto {
            Layout::Uniform {
                token_type: self.token_type,
                root_length: self.root_length,
            }
        } else {
            Layout::CharMap(self.char_map.clone())
        }
    }

    /// Minting order.
    #[must_use]
    pub const fn mode(&self) -> MintMode {
        if self.random {
            MintMode::Random
        } else {
            MintMode::Sequential
        }
    }

    /// Build the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the layout cannot be resolved.
    pub fn identifier_config(&self) -> Result<IdentifierConfig, MintError> {
        IdentifierConfig::new(
            &self.layout(),
            self.sans_vowel,
            self.prefix.clone(),
            self.prepend.clone(),
        )
    }

    /// Resolve the engine configuration, usage key and mode together.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the layout cannot be resolved.
    pub fn resolve(&self) -> Result<ResolvedSetting, MintError> {
        let config = self.identifier_config()?;
        let usage_key = usage_key(&config, self.sans_vowel);
        Ok(ResolvedSetting {
            config,
            usage_key,
            mode: self.mode(),
        })
    }

    /// Key of the permutation space this setting mints from.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the layout cannot be resolved.
    pub fn usage_key(&self) -> Result<String, MintError> {
        self.resolve().map(|resolved| resolved.usage_key)
    }
}

/// Settings that resolve to the same positions share a key, whichever layout
/// produced them. The prepend is a static marker and does not take part, and
/// the vowel flag only does when some position has letters.
fn usage_key(config: &IdentifierConfig, sans_vowel: bool) -> String {
    let classes: Vec<&str> = config
        .positions()
        .iter()
        .map(|position| position.class().label())
        .collect();
    let has_letters = config
        .positions()
        .iter()
        .any(|position| position.class().has_letters());
    let vowels = match (has_letters, sans_vowel) {
        (false, _) => "-",
        (true, true) => "sv",
        (true, false) => "v",
    };
    format!("{}|{}|{}", config.prefix(), vowels, classes.join("."))
}

/// Partial setting used to override the current one per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SettingOverrides {
    /// Override for [`Setting::prepend`].
    pub prepend: Option<String>,
    /// Override for [`Setting::prefix`].
    pub prefix: Option<String>,
    /// Override for [`Setting::token_type`].
    pub token_type: Option<TokenType>,
    /// Override for [`Setting::char_map`].
    pub char_map: Option<String>,
    /// Override for [`Setting::root_length`].
    pub root_length: Option<usize>,
    /// Override for [`Setting::sans_vowel`].
    pub sans_vowel: Option<bool>,
    /// Override for [`Setting::auto`].
    pub auto: Option<bool>,
    /// Override for [`Setting::random`].
    pub random: Option<bool>,
}

impl SettingOverrides {
    /// Apply the overrides on top of a base setting.
    #[must_use]
    pub fn apply(self, base: Setting) -> Setting {
        Setting {
            prepend: self.prepend.unwrap_or(base.prepend),
            prefix: self.prefix.unwrap_or(base.prefix),
            token_type: self.token_type.unwrap_or(base.token_type),
            char_map: self.char_map.unwrap_or(base.char_map),
            root_length: self.root_length.unwrap_or(base.root_length),
            sans_vowel: self.sans_vowel.unwrap_or(base.sans_vowel),
            auto: self.auto.unwrap_or(base.auto),
            random: self.random.unwrap_or(base.random),
        }
    }
}

//! Feed configuration.
//!
//! # Responsibility
//! - Hold process-wide feed settings (`SOFT_DELETE`, `NUM_TO_FETCH`).
//! - Load settings from JSON documents using settings-style key names.
//!
//! # Invariants
//! - `num_to_fetch` always lies within `[MIN_FETCH_LIMIT, MAX_FETCH_LIMIT]`.
//! - A constructed config is read-only for the lifetime of its owners.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Smallest fetch limit honored by live lists.
pub const MIN_FETCH_LIMIT: u32 = 1;
/// Largest fetch limit honored by live lists.
pub const MAX_FETCH_LIMIT: u32 = 100;
/// Default fetch limit when none is configured.
pub const DEFAULT_NUM_TO_FETCH: u32 = 10;

/// Feed behavior settings, passed explicitly into services at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// When `true`, delete sets a tombstone instead of removing the row.
    #[serde(rename = "SOFT_DELETE")]
    pub soft_delete: bool,
    /// Default live-list size used when the caller's limit is absent or bad.
    #[serde(rename = "NUM_TO_FETCH")]
    pub num_to_fetch: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            soft_delete: false,
            num_to_fetch: DEFAULT_NUM_TO_FETCH,
        }
    }
}

impl FeedConfig {
    /// Builds a validated config.
    pub fn new(soft_delete: bool, num_to_fetch: u32) -> Result<Self, ConfigError> {
        let config = Self {
            soft_delete,
            num_to_fetch,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON settings object.
    ///
    /// Missing keys fall back to defaults; unknown keys are ignored.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the default fetch limit is itself a valid limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_FETCH_LIMIT..=MAX_FETCH_LIMIT).contains(&self.num_to_fetch) {
            return Err(ConfigError::NumToFetchOutOfRange(self.num_to_fetch));
        }
        Ok(())
    }
}

/// Configuration load/validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    NumToFetchOutOfRange(u32),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid feed config: {message}"),
            Self::NumToFetchOutOfRange(value) => write!(
                f,
                "NUM_TO_FETCH must be within {MIN_FETCH_LIMIT}..={MAX_FETCH_LIMIT}, got {value}"
            ),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FeedConfig, DEFAULT_NUM_TO_FETCH};

    #[test]
    fn json_uses_settings_key_names_and_defaults_missing_keys() {
        let config = FeedConfig::from_json_str(r#"{"SOFT_DELETE": true}"#).unwrap();
        assert!(config.soft_delete);
        assert_eq!(config.num_to_fetch, DEFAULT_NUM_TO_FETCH);

        let config =
            FeedConfig::from_json_str(r#"{"NUM_TO_FETCH": 25, "UNRELATED": "x"}"#).unwrap();
        assert!(!config.soft_delete);
        assert_eq!(config.num_to_fetch, 25);
    }

    #[test]
    fn rejects_out_of_range_default_limit() {
        assert_eq!(
            FeedConfig::new(false, 0),
            Err(ConfigError::NumToFetchOutOfRange(0))
        );
        let err = FeedConfig::from_json_str(r#"{"NUM_TO_FETCH": 101}"#).unwrap_err();
        assert_eq!(err, ConfigError::NumToFetchOutOfRange(101));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = FeedConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

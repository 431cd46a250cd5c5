//! Registry configuration.
//!
//! Values come from a TOML file when one is given; anything left out falls
//! back to the defaults below.

use crate::registry::Amount;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Stake required from each player when none is configured.
pub const DEFAULT_STAKE: Amount = 1;

/// Seconds the player to move may stay idle before they can be punished.
pub const DEFAULT_PUNISH_TIMEOUT_SECS: u64 = 600;

/// Parameters fixed for the lifetime of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct WagerConfig {
    /// Exact amount each player escrows.
    #[serde(default = "default_stake")]
    stake: Amount,

    /// Inactivity window for `punish_current_player`, in seconds.
    #[serde(default = "default_punish_timeout_secs")]
    punish_timeout_secs: u64,
}

fn default_stake() -> Amount {
    DEFAULT_STAKE
}

fn default_punish_timeout_secs() -> u64 {
    DEFAULT_PUNISH_TIMEOUT_SECS
}

impl Default for WagerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STAKE, DEFAULT_PUNISH_TIMEOUT_SECS)
    }
}

impl WagerConfig {
    /// Creates a configuration from explicit values.
    pub fn new(stake: Amount, punish_timeout_secs: u64) -> Self {
        Self {
            stake,
            punish_timeout_secs,
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, does not parse, or sets a zero stake.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(
            stake = config.stake,
            punish_timeout_secs = config.punish_timeout_secs,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or a zero stake.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        if config.stake == 0 {
            return Err(ConfigError::new("Stake must be greater than zero".to_string()));
        }
        Ok(config)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// See [`WagerConfig::from_file`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WagerConfig::default();
        assert_eq!(*config.stake(), 1);
        assert_eq!(*config.punish_timeout_secs(), 600);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = WagerConfig::from_toml("stake = 5").unwrap();
        assert_eq!(*config.stake(), 5);
        assert_eq!(*config.punish_timeout_secs(), DEFAULT_PUNISH_TIMEOUT_SECS);
    }

    #[test]
    fn test_zero_stake_rejected() {
        let err = WagerConfig::from_toml("stake = 0").unwrap_err();
        assert!(err.message.contains("greater than zero"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stake = 3\npunish_timeout_secs = 60").unwrap();

        let config = WagerConfig::from_file(file.path()).unwrap();
        assert_eq!(config, WagerConfig::new(3, 60));
    }

    #[test]
    fn test_missing_file_reports_location() {
        let err = WagerConfig::from_file("/nonexistent/wager.toml").unwrap_err();
        assert!(err.message.starts_with("Failed to read config file"));
        assert!(err.file.ends_with("config.rs"));
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(WagerConfig::load(None).unwrap(), WagerConfig::default());
    }
}

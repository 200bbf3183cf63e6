//! Configuration file loading for the replay tool.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Settings for a replay run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Default log filter when `RUST_LOG` is unset. Defaults to "info".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Pretty-print the JSON output. Defaults to true.
    #[serde(default = "default_true")]
    pub pretty: bool,
    /// Print the legal moves of the final position. Defaults to true.
    #[serde(default = "default_true")]
    pub show_moves: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            log_level: default_log_level(),
            pretty: true,
            show_moves: true,
        }
    }
}

impl ReplayConfig {
    /// Loads the configuration.
    ///
    /// With no path the defaults are used. A given path must exist and
    /// contain valid TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Self::parse(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = ReplayConfig::parse(
            r#"
log_level = "debug"
pretty = false
show_moves = false
"#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(!config.pretty);
        assert!(!config.show_moves);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = ReplayConfig::parse("pretty = false\n").unwrap();
        assert_eq!(config.log_level, "info");
        assert!(!config.pretty);
        assert!(config.show_moves);

        assert_eq!(ReplayConfig::parse("").unwrap(), ReplayConfig::default());
    }

    #[test]
    fn test_no_path_means_defaults() {
        assert_eq!(ReplayConfig::load(None).unwrap(), ReplayConfig::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ReplayConfig::load(Some(Path::new("/nonexistent/replay.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let result = ReplayConfig::parse("pretty = \"sometimes\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}

//! Error types for configuration handling

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating the configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid YAML or does not match the schema
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more top-level keys occur more than once.
    ///
    /// Under the default `DuplicateKeys::Deny` policy this is a hard error:
    /// a YAML loader that silently keeps the last occurrence would discard
    /// half of the authored document.
    #[error("duplicate top-level keys in configuration: {}", keys.join(", "))]
    DuplicateKeys { keys: Vec<String> },

    /// Semantic validation failed. All problems are collected, not just the
    /// first one encountered.
    #[error("invalid configuration: {}", problems.join("; "))]
    Validation { problems: Vec<String> },
}

impl ConfigError {
    /// Convenience constructor for a single validation problem
    pub fn validation(problem: impl Into<String>) -> Self {
        Self::Validation {
            problems: vec![problem.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_keys_display() {
        let err = ConfigError::DuplicateKeys {
            keys: vec!["symbols".to_string(), "analysis".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "duplicate top-level keys in configuration: symbols, analysis"
        );
    }

    #[test]
    fn test_validation_display() {
        let err = ConfigError::Validation {
            problems: vec![
                "analysis.weights must sum to 1.0".to_string(),
                "symbols must not be empty".to_string(),
            ],
        };
        assert!(err.to_string().starts_with("invalid configuration: "));
        assert!(err.to_string().contains("; "));
    }
}

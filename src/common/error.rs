//! Error types for the mini test suite
//!
//! Only the configuration errors ever reach `main`. Everything raised while a
//! test entry point runs is caught by the dispatcher and turned into a failed
//! outcome, using [`Error::code`] as the reported failure code.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the mini test suite
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Scenario file not found. Copy minitest.dist.yaml to minitest.yaml and customise it before running the mini test suite. Searched: {searched}")]
    ConfigurationMissing { searched: String },

    #[error("Invalid scenario file '{path}': {message}")]
    ConfigParse { path: String, message: String },

    // === Connector Errors ===
    #[error("S3 {operation} failed: {message}")]
    Connector { operation: String, message: String },

    #[error("Object '{key}' not found in bucket '{bucket}'")]
    ObjectNotFound { bucket: String, key: String },

    // === Test Errors ===
    #[error("Verification failed: {0}")]
    Verification(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration missing error listing every searched location
    pub fn configuration_missing<S: AsRef<str>>(paths: &[S]) -> Self {
        Self::ConfigurationMissing {
            searched: paths.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Create a scenario file parse error
    pub fn config_parse(path: &std::path::Path, message: impl ToString) -> Self {
        Self::ConfigParse {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a connector error for a failed S3 operation
    pub fn connector(operation: &str, message: impl ToString) -> Self {
        Self::Connector {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an object not found error
    pub fn object_not_found(bucket: &str, key: &str) -> Self {
        Self::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::ConfigurationMissing { .. } => "CONFIGURATION_MISSING",
            Error::ConfigParse { .. } => "CONFIG_PARSE",
            Error::Connector { .. } => "CONNECTOR",
            Error::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            Error::Verification(_) => "VERIFICATION",
            Error::Io(_) | Error::FileRead { .. } => "IO",
            Error::Json(_) => "JSON",
        }
    }

    /// Whether this error must stop the process before any scenario runs
    pub fn is_fatal_configuration(&self) -> bool {
        matches!(
            self,
            Error::ConfigurationMissing { .. } | Error::ConfigParse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_missing_lists_paths() {
        let err = Error::configuration_missing(&["./minitest.yaml", "./minitest.toml"]);
        let msg = err.to_string();
        assert!(msg.contains("./minitest.yaml, ./minitest.toml"));
        assert!(err.is_fatal_configuration());
        assert_eq!(err.code(), "CONFIGURATION_MISSING");
    }

    #[test]
    fn test_runtime_errors_are_not_fatal() {
        let err = Error::connector("PutObject", "access denied");
        assert_eq!(err.to_string(), "S3 PutObject failed: access denied");
        assert!(!err.is_fatal_configuration());
        assert_eq!(Error::Verification("x".into()).code(), "VERIFICATION");
    }
}

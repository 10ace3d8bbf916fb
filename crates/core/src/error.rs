//! Error types for sp-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for sp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sp-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file or environment error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target settings are incomplete or malformed
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Named target not found in the config file
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or provider error
    #[error("Network error: {0}")]
    Network(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidTarget(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::Network(_) => 3,                                                // NetworkError
            Error::Auth(_) => 4,                                                   // AuthError
            Error::NotFound(_) | Error::TargetNotFound(_) => 5,                    // NotFound
            _ => 1,                                                                // GeneralError
        }
    }

    /// Whether this error means the addressed resource does not exist
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidTarget("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::TargetNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::TargetNotFound("tebi".into());
        assert_eq!(err.to_string(), "Target not found: tebi");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("bucket/key".into()).is_not_found());
        assert!(!Error::Network("reset".into()).is_not_found());
    }
}

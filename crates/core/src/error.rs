//! Error types for cx-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for cx-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cx-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid object key, item reference or file name
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Credential issuance or exchange failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Remote enumeration failed
    #[error("Listing failed: {0}")]
    List(String),

    /// A single item transfer failed
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// A batch was started without the selections it needs
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// The external rclone tool failed or produced unusable output
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error
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
            Error::InvalidPath(_) | Error::Config(_) | Error::InvalidBatch(_) => 2, // UsageError
            Error::Network(_) | Error::List(_) => 3,                                // NetworkError
            Error::Auth(_) => 4,                                                    // AuthError
            Error::NotFound(_) => 5,                                                // NotFound
            _ => 1,                                                                 // GeneralError
        }
    }

    /// Reason text without the category prefix added by `Display`
    pub fn reason(&self) -> String {
        match self {
            Error::Config(s)
            | Error::InvalidPath(s)
            | Error::Auth(s)
            | Error::List(s)
            | Error::Transfer(s)
            | Error::InvalidBatch(s)
            | Error::Gateway(s)
            | Error::NotFound(s)
            | Error::Network(s)
            | Error::General(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

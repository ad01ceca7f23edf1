//! Error types for borgdeck

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for borgdeck operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Cannot access {}: {source}", path.display())]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("Backup tool error: {reason}")]
    BackupTool { reason: String },

    #[error("Secret store error: {reason}")]
    SecretStore { reason: String },

    #[error("Operation cancelled by user")]
    Cancelled,
}

/// Result type alias for borgdeck operations
pub type Result<T> = std::result::Result<T, Error>;

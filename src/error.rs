use std::path::PathBuf;

use thiserror::Error;

/// Classifies parser errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Suffix list could not be fetched and no cached copy exists
    Connect,
    /// Suffix list text is not in the expected format
    UnparsableCatalog,
    /// Cache record could not be written
    Persist,
    /// Input cannot be classified as a domain name
    UnparsableInput,
    /// I/O error outside of cache persistence
    Io,
    /// Cache record encoding or decoding failure
    Serialization,
}

/// Domain parser error types
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Connect error: {0}")]
    Connect(String),

    #[error("Unparsable suffix list: {0}")]
    UnparsableCatalog(String),

    #[error("Could not write cache file {}: {message}", path.display())]
    Persist { path: PathBuf, message: String },

    #[error("Unparsable domain name: {0}")]
    UnparsableInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Connect(_) => ErrorKind::Connect,
            DomainError::UnparsableCatalog(_) => ErrorKind::UnparsableCatalog,
            DomainError::Persist { .. } => ErrorKind::Persist,
            DomainError::UnparsableInput(_) => ErrorKind::UnparsableInput,
            DomainError::IoError(_) => ErrorKind::Io,
            DomainError::SerializationError(_) => ErrorKind::Serialization,
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

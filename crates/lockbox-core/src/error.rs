//! Error types for Lockbox core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-facing messages and hints. No variant ever carries plaintext.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for Lockbox operations.
pub type Result<T> = std::result::Result<T, LockboxError>;

/// Core error type for Lockbox operations.
#[derive(Debug, Error)]
pub enum LockboxError {
    /// A write was attempted after the master key's TTL elapsed
    #[error("Master key expired at {expired_at}; rotate the key before writing")]
    KeyExpired { expired_at: DateTime<Utc> },

    /// No entry for the given name
    #[error("Not found: {0}")]
    NotFound(String),

    /// Decryption, padding, base64 or UTF-8 failure
    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Bad magic tag, unsupported format version or truncated payload
    #[error("Malformed store file: {0}")]
    MalformedStoreFile(String),

    /// Persisted key metadata or settings could not be read or written
    #[error("Config error: {0}")]
    Config(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for LockboxError {
    fn from(err: std::io::Error) -> Self {
        LockboxError::Storage(err.to_string())
    }
}

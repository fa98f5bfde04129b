//! Keymatch Error Types
//!
//! Centralized error handling for the verification utilities.

use thiserror::Error;

/// Central error type for keymatch
#[derive(Error, Debug)]
pub enum KeymatchError {
    #[error("invalid OTP secret: {0}")]
    InvalidSecret(String),

    #[error("invalid code format: {0:?}")]
    InvalidCode(String),

    #[error("no matching code")]
    CodeNotFound,

    #[error("code expired for user {0}")]
    CodeExpired(String),

    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for keymatch operations
pub type KeymatchResult<T> = Result<T, KeymatchError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for KeymatchError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        KeymatchError::Lock(err.to_string())
    }
}

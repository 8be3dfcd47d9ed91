//! Error types for F2FAuth identity operations.
//!
//! Every variant carries the full server-side detail for logging. What a
//! caller may see is decided by [`IdentityError::public_message`]: only
//! validation failures explain themselves, every other kind is reported with
//! a fixed generic text so that a failed authentication never reveals which
//! check rejected it.

use thiserror::Error;

use crate::store::StoreError;

/// Caller-visible classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed request field
    Validation,
    /// Unknown device name
    NotFound,
    /// Bad signature, realm mismatch, self-authentication, unfinalized device
    AuthenticationFailed,
    /// Caller lacks the capability for the operation
    Unauthorized,
    /// Composite credential envelope could not be decomposed
    MalformedCredential,
    /// Store or primitive failure
    Internal,
}

/// Errors that can occur in identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Device not found: {name}")]
    DeviceNotFound { name: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::Validation(_) => ErrorKind::Validation,
            IdentityError::DeviceNotFound { .. } => ErrorKind::NotFound,
            IdentityError::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            IdentityError::Unauthorized(_) => ErrorKind::Unauthorized,
            IdentityError::MalformedCredential(_) => ErrorKind::MalformedCredential,
            IdentityError::Store(_) | IdentityError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Text that may be returned to the caller.
    pub fn public_message(&self) -> String {
        match self {
            IdentityError::Validation(msg) => msg.clone(),
            IdentityError::DeviceNotFound { .. } => "Not Found".to_string(),
            IdentityError::AuthenticationFailed(_) | IdentityError::Unauthorized(_) => {
                "Forbidden".to_string()
            }
            IdentityError::MalformedCredential(_) => "Bad Request".to_string(),
            IdentityError::Store(_) | IdentityError::Internal(_) => {
                "Internal Server Error".to_string()
            }
        }
    }
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { name } => IdentityError::DeviceNotFound { name },
            other => IdentityError::Store(other),
        }
    }
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

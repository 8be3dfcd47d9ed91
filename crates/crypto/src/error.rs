//! Error types for cryptographic operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Input was not valid base64 in the expected alphabet
    #[error("Invalid base64 in {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    /// Bytes did not hold a usable RSA public key
    #[error("Invalid public key: {0}")]
    InvalidKey(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

//! Cryptographic primitives for F2FAuth device identities.
//!
//! This crate provides the digest and signature verification primitive used by
//! the peer authentication protocol, the public key fingerprint, the base64
//! codecs shared by devices and server, and a device-side signer.
//!
//! # Algorithms
//!
//! - **Digest**: SHA-256
//! - **Signatures**: RSA PKCS#1 v1.5 over the SHA-256 digest
//! - **Public keys**: DER-encoded SubjectPublicKeyInfo holding an RSA key
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - Verification never panics and never raises: a malformed signature is a
//!   failed verification
//! - Private keys are never logged

pub mod digest;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod signing;

#[cfg(test)]
mod test_vectors;

pub use digest::{digest, DIGEST_LEN};
pub use error::{CryptoError, CryptoResult};
pub use keys::{decode_public_key, fingerprint, parse_public_key};
pub use signing::{verify_signature, DeviceSigner, DEFAULT_KEY_BITS};

pub use rsa::RsaPublicKey;

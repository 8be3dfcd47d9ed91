//! SHA-256 digest.

use sha2::{Digest, Sha256};

/// Length in bytes of every digest produced by this module.
pub const DIGEST_LEN: usize = 32;

/// SHA-256 of `message`.
pub fn digest(message: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(message).into()
}

/// Lowercase hex SHA-256 of `message`.
pub fn digest_hex(message: &[u8]) -> String {
    hex::encode(digest(message))
}

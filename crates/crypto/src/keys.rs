//! Device public keys and their fingerprints.
//!
//! A device's public key is registered as URL-safe base64 wrapping a DER
//! SubjectPublicKeyInfo. The fingerprint is the lowercase hex SHA-256 of the
//! decoded DER bytes; it is computed once at finalization and stored.

use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;

use crate::digest::digest_hex;
use crate::encoding::decode_b64url;
use crate::error::{CryptoError, CryptoResult};

/// Hex SHA-256 of the decoded public key bytes.
pub fn fingerprint(decoded_public_key: &[u8]) -> String {
    digest_hex(decoded_public_key)
}

/// Decode the base64url wrapper of an encoded public key.
pub fn decode_key_bytes(encoded: &str) -> CryptoResult<Vec<u8>> {
    decode_b64url("public key", encoded)
}

/// Parse DER SubjectPublicKeyInfo bytes into an RSA key.
pub fn parse_public_key(der: &[u8]) -> CryptoResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(der).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Decode and parse an encoded public key.
pub fn decode_public_key(encoded: &str) -> CryptoResult<RsaPublicKey> {
    let der = decode_key_bytes(encoded)?;
    parse_public_key(&der)
}

//! Base64 codecs used on the wire.
//!
//! Public keys and device signatures travel as URL-safe base64 with padding.
//! Device key stores wrap their output at 76 columns, so line breaks are
//! skipped before decoding. Composite credentials use URL-safe base64 without
//! padding.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;

use crate::error::{CryptoError, CryptoResult};

/// Decode padded URL-safe base64, ignoring `\r` and `\n`.
pub fn decode_b64url(what: &'static str, encoded: &str) -> CryptoResult<Vec<u8>> {
    let result = if encoded.contains(['\r', '\n']) {
        let compact: String = encoded.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        URL_SAFE.decode(compact)
    } else {
        URL_SAFE.decode(encoded)
    };

    result.map_err(|e| CryptoError::Decode {
        what,
        reason: e.to_string(),
    })
}

/// Encode as padded URL-safe base64 on a single line.
pub fn encode_b64url(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Decode unpadded URL-safe base64.
pub fn decode_b64url_raw(what: &'static str, encoded: &str) -> CryptoResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| CryptoError::Decode {
            what,
            reason: e.to_string(),
        })
}

/// Encode as unpadded URL-safe base64.
pub fn encode_b64url_raw(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

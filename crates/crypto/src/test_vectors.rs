//! Known-answer vectors for the digest and fingerprint.
//!
//! The expected values are the published SHA-256 outputs (FIPS 180-2
//! examples), so a regression in either function shows up against an
//! independent computation.

use crate::digest::{digest, digest_hex};
use crate::keys::fingerprint;

/// A known-answer vector.
pub struct DigestTestVector {
    pub name: &'static str,
    pub input: &'static [u8],
    pub expected_hex: &'static str,
}

pub fn get_test_vectors() -> Vec<DigestTestVector> {
    vec![
        DigestTestVector {
            name: "empty",
            input: b"",
            expected_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        DigestTestVector {
            name: "abc",
            input: b"abc",
            expected_hex: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        DigestTestVector {
            name: "two_block",
            input: b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
            expected_hex: "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
        },
    ]
}

#[test]
fn test_digest_vectors() {
    for vector in get_test_vectors() {
        assert_eq!(digest_hex(vector.input), vector.expected_hex, "{}", vector.name);
        assert_eq!(
            hex::encode(digest(vector.input)),
            vector.expected_hex,
            "{}",
            vector.name
        );
    }
}

#[test]
fn test_fingerprint_vectors() {
    for vector in get_test_vectors() {
        assert_eq!(fingerprint(vector.input), vector.expected_hex, "{}", vector.name);
        // pure function: repeated calls agree
        assert_eq!(fingerprint(vector.input), fingerprint(vector.input));
    }
}

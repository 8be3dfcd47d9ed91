//! Signature verification and the device-side signer.
//!
//! Every signed message in the face-to-face protocol is verified the same
//! way: SHA-256 the message bytes, then check an RSA PKCS#1 v1.5 signature
//! over that digest. [`verify_signature`] is the only verification entry
//! point and it never returns an error; failures are logged and reported as
//! `false`.
//!
//! [`DeviceSigner`] is the device half: it owns an RSA private key, exports
//! the encoded public key used at finalization and produces signatures in the
//! encoding the server expects.

use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::digest::digest;
use crate::encoding::encode_b64url;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::fingerprint;

/// Modulus size used for newly generated device keys.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Verify `signature` over `message` with `public_key`.
///
/// Returns `false` for a malformed signature, a signature by another key, or a
/// signature over a different message.
pub fn verify_signature(public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let hashed = digest(message);
    match public_key.verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, signature) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(
                error = %e,
                signature_len = signature.len(),
                "RSA signature verification failed"
            );
            false
        }
    }
}

/// RSA key pair held by a device.
pub struct DeviceSigner {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    public_key_der: Vec<u8>,
}

impl DeviceSigner {
    /// Generate a fresh key pair with [`DEFAULT_KEY_BITS`].
    pub fn generate() -> CryptoResult<Self> {
        Self::generate_with_bits(DEFAULT_KEY_BITS)
    }

    pub fn generate_with_bits(bits: usize) -> CryptoResult<Self> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Self::from_private_key(private_key)
    }

    pub fn from_private_key(private_key: RsaPrivateKey) -> CryptoResult<Self> {
        let public_key = private_key.to_public_key();
        let public_key_der = public_key
            .to_public_key_der()
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?
            .as_bytes()
            .to_vec();

        Ok(Self {
            private_key,
            public_key,
            public_key_der,
        })
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// DER SubjectPublicKeyInfo of the public key.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    /// Public key in the form submitted at finalization.
    pub fn encoded_public_key(&self) -> String {
        encode_b64url(&self.public_key_der)
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public_key_der)
    }

    /// Raw PKCS#1 v1.5 signature over SHA-256(`message`).
    pub fn sign(&self, message: &[u8]) -> CryptoResult<Vec<u8>> {
        let hashed = digest(message);
        self.private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)
            .map_err(|e| CryptoError::Signing(e.to_string()))
    }

    /// Signature encoded as padded URL-safe base64.
    pub fn sign_encoded(&self, message: &str) -> CryptoResult<String> {
        self.sign(message.as_bytes()).map(|sig| encode_b64url(&sig))
    }
}

impl std::fmt::Debug for DeviceSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSigner")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

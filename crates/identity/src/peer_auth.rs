//! Face-to-face mutual authentication between two finalized devices.
//!
//! # Protocol Flow
//!
//! Two devices A (initiator) and B (peer) meet off-band:
//!
//! 1. A picks a token `ts` and signs `auth1|A|ts` → `sig`
//! 2. B picks a token `pts` and signs `auth2|A|ts|sig|B|pts` → `psig`
//! 3. A client submits `(A, ts, sig, B, pts, psig)` for issuance
//!
//! B's signature covers A's name, token and signature text, so B's
//! attestation cannot be replayed against any other A-side assertion.
//!
//! # Checks, in order
//!
//! 1. `name != peerName` (before any decoding or lookup)
//! 2. no field contains the `|` delimiter
//! 3. decode `sig`, look up A, verify `sig` over the `auth1` message
//! 4. decode `peerSig`, look up B, require `A.realm == B.realm`
//! 5. verify `peerSig` over the `auth2` message with B's key
//!
//! # Composite credential
//!
//! The unpadded URL-safe base64 of `name|ts|sig|peerName|peerTs|peerSig`.
//! It carries no server signature. Verification decomposes it and reruns
//! every check above against the current store, so the result is recomputed
//! on every call and nothing is cached. Tokens are opaque: no freshness window
//! is applied and credentials do not expire.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use f2fauth_crypto::encoding::{decode_b64url, decode_b64url_raw, encode_b64url_raw};
use f2fauth_crypto::{decode_public_key, verify_signature, RsaPublicKey};

use crate::device::Device;
use crate::error::{IdentityError, IdentityResult};
use crate::store::DeviceStore;

/// Prefix of the message signed by the initiator.
pub const INITIATOR_TAG: &str = "auth1";
/// Prefix of the message signed by the peer.
pub const PEER_TAG: &str = "auth2";
/// Separator used in signed messages and in the credential.
pub const FIELD_DELIMITER: char = '|';
/// Number of fields in a composite credential.
pub const CREDENTIAL_FIELDS: usize = 6;

/// The six fields produced by one handshake.
///
/// `sig` and `peer_sig` are kept as the padded URL-safe base64 text the
/// devices produced; that text is what the peer signs and what the
/// credential embeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthAssertion {
    pub name: String,
    pub ts: String,
    pub sig: String,
    pub peer_name: String,
    pub peer_ts: String,
    pub peer_sig: String,
}

impl AuthAssertion {
    /// Message the initiator signs: `auth1|name|ts`.
    pub fn initiator_message(name: &str, ts: &str) -> String {
        [INITIATOR_TAG, name, ts].join("|")
    }

    /// Message the peer signs: `auth2|name|ts|sig|peerName|peerTs`.
    pub fn peer_message(name: &str, ts: &str, sig: &str, peer_name: &str, peer_ts: &str) -> String {
        [PEER_TAG, name, ts, sig, peer_name, peer_ts].join("|")
    }

    /// Fields paired with their request parameter names.
    fn named_fields(&self) -> [(&'static str, &str); CREDENTIAL_FIELDS] {
        [
            ("name", self.name.as_str()),
            ("ts", self.ts.as_str()),
            ("sig", self.sig.as_str()),
            ("peerName", self.peer_name.as_str()),
            ("peerTs", self.peer_ts.as_str()),
            ("peerSig", self.peer_sig.as_str()),
        ]
    }

    /// Reject fields that would split differently once joined.
    fn check_delimiters(&self) -> IdentityResult<()> {
        for (field, value) in self.named_fields() {
            if value.contains(FIELD_DELIMITER) {
                warn!(name = %self.name, field, "Field contains credential delimiter");
                return Err(IdentityError::Validation(format!(
                    "Malformed '{}' parameter",
                    field
                )));
            }
        }
        Ok(())
    }

    fn signed_initiator_message(&self) -> String {
        Self::initiator_message(&self.name, &self.ts)
    }

    fn signed_peer_message(&self) -> String {
        Self::peer_message(&self.name, &self.ts, &self.sig, &self.peer_name, &self.peer_ts)
    }

    /// Encode as a composite credential.
    pub fn to_credential(&self) -> String {
        let joined = [
            self.name.as_str(),
            &self.ts,
            &self.sig,
            &self.peer_name,
            &self.peer_ts,
            &self.peer_sig,
        ]
        .join("|");
        encode_b64url_raw(joined.as_bytes())
    }

    /// Decompose a composite credential into its six fields.
    pub fn from_credential(credential: &str) -> IdentityResult<Self> {
        let raw = decode_b64url_raw("credential", credential)
            .map_err(|e| IdentityError::MalformedCredential(e.to_string()))?;
        let text = String::from_utf8(raw)
            .map_err(|e| IdentityError::MalformedCredential(format!("not UTF-8: {}", e)))?;

        let fields: Vec<&str> = text.split(FIELD_DELIMITER).collect();
        let [name, ts, sig, peer_name, peer_ts, peer_sig] = fields.as_slice() else {
            return Err(IdentityError::MalformedCredential(format!(
                "expected {} fields, found {}",
                CREDENTIAL_FIELDS,
                fields.len()
            )));
        };

        Ok(Self {
            name: name.to_string(),
            ts: ts.to_string(),
            sig: sig.to_string(),
            peer_name: peer_name.to_string(),
            peer_ts: peer_ts.to_string(),
            peer_sig: peer_sig.to_string(),
        })
    }
}

/// Verifies handshakes against the device store and issues credentials.
pub struct PeerAuthenticator {
    store: Arc<dyn DeviceStore>,
}

impl PeerAuthenticator {
    pub fn new(store: Arc<dyn DeviceStore>) -> Self {
        Self { store }
    }

    /// Verify both signatures and return the composite credential.
    pub fn issue_credential(&self, assertion: &AuthAssertion) -> IdentityResult<String> {
        self.verify_assertion(assertion)?;
        let credential = assertion.to_credential();
        info!(
            name = %assertion.name,
            peer_name = %assertion.peer_name,
            "Composite credential issued"
        );
        Ok(credential)
    }

    /// Decompose a credential and rerun every issuance check.
    ///
    /// Bad encodings inside the credential are reported as a malformed
    /// credential; a device that no longer exists fails authentication.
    pub fn verify_credential(&self, credential: &str) -> IdentityResult<AuthAssertion> {
        let assertion = AuthAssertion::from_credential(credential)?;

        self.verify_assertion(&assertion).map_err(|e| match e {
            IdentityError::Validation(msg) => IdentityError::MalformedCredential(msg),
            IdentityError::DeviceNotFound { name } => {
                IdentityError::AuthenticationFailed(format!("credential names unknown device {}", name))
            }
            other => other,
        })?;

        debug!(
            name = %assertion.name,
            peer_name = %assertion.peer_name,
            "Composite credential verified"
        );
        Ok(assertion)
    }

    fn verify_assertion(&self, a: &AuthAssertion) -> IdentityResult<()> {
        // A single device must never be able to build a credential alone
        if a.name == a.peer_name {
            warn!(name = %a.name, "Rejected self-authentication attempt");
            return Err(IdentityError::AuthenticationFailed(format!(
                "self-authentication by {}",
                a.name
            )));
        }
        a.check_delimiters()?;

        let sig = decode_b64url("sig", &a.sig).map_err(|e| {
            warn!(name = %a.name, sig = %a.sig, error = %e, "Undecodable initiator signature");
            IdentityError::Validation("Malformed 'sig' parameter".to_string())
        })?;
        let device = self.lookup(&a.name)?;
        let key = device_key(&device)?;

        debug!(
            name = %a.name,
            ts = %a.ts,
            fingerprint = %device.public_key_fingerprint(),
            "Verifying initiator signature"
        );
        if !verify_signature(&key, a.signed_initiator_message().as_bytes(), &sig) {
            warn!(
                name = %a.name,
                ts = %a.ts,
                sig = %a.sig,
                fingerprint = %device.public_key_fingerprint(),
                "Initiator signature verification failed"
            );
            return Err(IdentityError::AuthenticationFailed(format!(
                "initiator signature invalid for {}",
                a.name
            )));
        }

        let peer_sig = decode_b64url("peerSig", &a.peer_sig).map_err(|e| {
            warn!(peer_name = %a.peer_name, peer_sig = %a.peer_sig, error = %e, "Undecodable peer signature");
            IdentityError::Validation("Malformed 'peerSig' parameter".to_string())
        })?;
        let peer = self.lookup(&a.peer_name)?;

        if device.realm != peer.realm {
            warn!(
                name = %a.name,
                realm = %device.realm,
                peer_name = %a.peer_name,
                peer_realm = %peer.realm,
                "Realm mismatch"
            );
            return Err(IdentityError::AuthenticationFailed(format!(
                "realm mismatch: {} != {}",
                device.realm, peer.realm
            )));
        }

        let peer_key = device_key(&peer)?;
        debug!(
            peer_name = %a.peer_name,
            peer_ts = %a.peer_ts,
            fingerprint = %peer.public_key_fingerprint(),
            "Verifying peer signature"
        );
        if !verify_signature(&peer_key, a.signed_peer_message().as_bytes(), &peer_sig) {
            warn!(
                name = %a.name,
                peer_name = %a.peer_name,
                peer_ts = %a.peer_ts,
                peer_sig = %a.peer_sig,
                fingerprint = %peer.public_key_fingerprint(),
                "Peer signature verification failed"
            );
            return Err(IdentityError::AuthenticationFailed(format!(
                "peer signature invalid for {}",
                a.peer_name
            )));
        }

        info!(
            name = %a.name,
            peer_name = %a.peer_name,
            realm = %device.realm,
            "Mutual authentication verified"
        );
        Ok(())
    }

    fn lookup(&self, name: &str) -> IdentityResult<Device> {
        self.store.find_by_name(name).map_err(|e| {
            warn!(name = %name, error = %e, "Device lookup failed");
            IdentityError::from(e)
        })
    }
}

/// Decode the stored key of a finalized device.
fn device_key(device: &Device) -> IdentityResult<RsaPublicKey> {
    if !device.is_finalized() {
        warn!(name = %device.name, "Device not finalized");
        return Err(IdentityError::AuthenticationFailed(format!(
            "device {} not finalized",
            device.name
        )));
    }

    decode_public_key(device.public_key()).map_err(|e| {
        warn!(name = %device.name, error = %e, "Stored public key is unusable");
        IdentityError::Internal(format!("stored key for {}: {}", device.name, e))
    })
}

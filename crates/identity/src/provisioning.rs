//! Device provisioning and finalization.
//!
//! # State Transitions
//!
//! ```text
//! (none)
//!     ↓ provision()          name = hex(SHA-256(32 random bytes)), realm = server realm
//! Provisioned
//!     ↓ finalize(name, pk)   key + fingerprint bound together
//! Finalized
//!     ↺ finalize(name, pk)   overwrites the previous binding, last write wins
//! ```
//!
//! Device names come from a single process-wide generator. Its RNG sits
//! behind a mutex so concurrent provisioning calls never share generator
//! state unsynchronised.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use f2fauth_crypto::digest::digest_hex;
use f2fauth_crypto::keys::{decode_key_bytes, fingerprint, parse_public_key};

use crate::device::{current_timestamp, Device};
use crate::error::{IdentityError, IdentityResult};
use crate::store::DeviceStore;

/// Random bytes drawn per generated name.
pub const NAME_ENTROPY_BYTES: usize = 32;

/// Thread-safe source of device names.
pub struct NameGenerator {
    rng: Mutex<StdRng>,
}

impl NameGenerator {
    /// Deterministic sequence, for reproducible deployments and tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn from_config(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// Next 64-char lowercase hex name.
    pub fn next_name(&self) -> IdentityResult<String> {
        let mut bytes = [0u8; NAME_ENTROPY_BYTES];
        {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| IdentityError::Internal("name generator lock poisoned".into()))?;
            rng.fill_bytes(&mut bytes);
        }
        Ok(digest_hex(&bytes))
    }
}

impl std::fmt::Debug for NameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameGenerator").finish_non_exhaustive()
    }
}

/// Creates device identities and binds their public keys.
pub struct Provisioner {
    store: Arc<dyn DeviceStore>,
    realm: String,
    names: NameGenerator,
}

impl Provisioner {
    pub fn new(store: Arc<dyn DeviceStore>, realm: impl Into<String>, names: NameGenerator) -> Self {
        Self {
            store,
            realm: realm.into(),
            names,
        }
    }

    /// Realm stamped on every device this provisioner creates.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Create a new device in the Provisioned state.
    pub fn provision(&self) -> IdentityResult<Device> {
        let name = self.names.next_name()?;
        let device = Device::provisioned(name, self.realm.clone(), current_timestamp());

        self.store.create(&device).map_err(|e| {
            warn!(name = %device.name, error = %e, "Failed to persist provisioned device");
            IdentityError::from(e)
        })?;

        info!(name = %device.name, realm = %device.realm, "Device provisioned");
        Ok(device)
    }

    /// Bind `encoded_public_key` to the device `name`.
    ///
    /// Repeatable: each call replaces the previous key and fingerprint.
    pub fn finalize(&self, name: &str, encoded_public_key: &str) -> IdentityResult<Device> {
        if name.is_empty() {
            return Err(IdentityError::Validation(
                "Must provide a 'name' parameter".to_string(),
            ));
        }
        if encoded_public_key.is_empty() {
            return Err(IdentityError::Validation(
                "Must provide a 'pk' parameter".to_string(),
            ));
        }

        let mut device = self.store.find_by_name(name).map_err(|e| {
            warn!(name = %name, error = %e, "Finalize lookup failed");
            IdentityError::from(e)
        })?;

        let der = decode_key_bytes(encoded_public_key).map_err(|e| {
            warn!(name = %name, error = %e, "Finalize rejected undecodable key");
            IdentityError::Validation("Malformed 'pk' parameter".to_string())
        })?;
        parse_public_key(&der).map_err(|e| {
            warn!(name = %name, error = %e, "Finalize rejected non-RSA key");
            IdentityError::Validation("'pk' is not an RSA public key".to_string())
        })?;

        let fp = fingerprint(&der);
        let previous = device.public_key_fingerprint().to_string();
        device.bind_public_key(encoded_public_key, fp);
        device.updated_at = current_timestamp();

        self.store.update(&device).map_err(|e| {
            warn!(name = %name, error = %e, "Failed to persist finalized device");
            IdentityError::from(e)
        })?;

        if previous.is_empty() {
            info!(name = %name, fingerprint = %device.public_key_fingerprint(), "Device finalized");
        } else {
            info!(
                name = %name,
                fingerprint = %device.public_key_fingerprint(),
                previous_fingerprint = %previous,
                "Device key replaced"
            );
        }
        Ok(device)
    }
}

//! Device identity records.
//!
//! A device is created in the Provisioned state with a server-assigned name
//! and the server's realm. Binding a public key moves it to Finalized. The
//! key and its fingerprint are only ever written together.

use serde::{Deserialize, Serialize};

/// Lifecycle state derived from the key fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    /// Created, no public key bound yet
    Provisioned,
    /// Public key and fingerprint bound
    Finalized,
}

/// A registered device identity.
///
/// Serialized with the field names existing device clients parse. Records
/// whose key and fingerprint disagree are refused on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", try_from = "DeviceRecord")]
pub struct Device {
    /// 64-char lowercase hex, assigned at provisioning, never changes
    pub name: String,
    /// Isolation domain; only devices in the same realm authenticate each other
    pub realm: String,
    /// URL-safe base64 of the DER SubjectPublicKeyInfo, empty until finalized
    pub(crate) public_key: String,
    /// Hex SHA-256 of the decoded public key, empty until finalized
    pub(crate) public_key_fingerprint: String,
    pub display_name: String,
    pub image_rel_path: String,
    /// Unix epoch milliseconds
    pub created_at: u64,
    /// Unix epoch milliseconds
    pub updated_at: u64,
    /// Set when the record is logically deleted
    pub deleted_at: Option<u64>,
}

impl Device {
    /// New record in the Provisioned state.
    pub fn provisioned(name: impl Into<String>, realm: impl Into<String>, now: u64) -> Self {
        Self {
            name: name.into(),
            realm: realm.into(),
            public_key: String::new(),
            public_key_fingerprint: String::new(),
            display_name: String::new(),
            image_rel_path: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn state(&self) -> DeviceState {
        if self.public_key.is_empty() {
            DeviceState::Provisioned
        } else {
            DeviceState::Finalized
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.state() == DeviceState::Finalized
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn public_key_fingerprint(&self) -> &str {
        &self.public_key_fingerprint
    }

    /// Bind a key and its fingerprint, replacing any previous binding.
    pub fn bind_public_key(
        &mut self,
        encoded_public_key: impl Into<String>,
        fingerprint: impl Into<String>,
    ) {
        self.public_key = encoded_public_key.into();
        self.public_key_fingerprint = fingerprint.into();
    }
}

/// Wire form of [`Device`], checked before it becomes one.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeviceRecord {
    name: String,
    realm: String,
    #[serde(default)]
    public_key: String,
    #[serde(default)]
    public_key_fingerprint: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    image_rel_path: String,
    created_at: u64,
    updated_at: u64,
    #[serde(default)]
    deleted_at: Option<u64>,
}

impl TryFrom<DeviceRecord> for Device {
    type Error = String;

    fn try_from(record: DeviceRecord) -> Result<Self, Self::Error> {
        if record.public_key.is_empty() != record.public_key_fingerprint.is_empty() {
            return Err(format!(
                "device {}: PublicKey and PublicKeyFingerprint must be set together",
                record.name
            ));
        }

        Ok(Device {
            name: record.name,
            realm: record.realm,
            public_key: record.public_key,
            public_key_fingerprint: record.public_key_fingerprint,
            display_name: record.display_name,
            image_rel_path: record.image_rel_path,
            created_at: record.created_at,
            updated_at: record.updated_at,
            deleted_at: record.deleted_at,
        })
    }
}

/// Get current timestamp in milliseconds.
pub(crate) fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

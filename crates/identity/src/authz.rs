//! Capability checks for device administration.
//!
//! Callers are identified by the fingerprint of the key they presented to the
//! transport layer. Provisioning and finalization require an administrator;
//! reading a device record requires an administrator or the device itself.

use std::collections::HashSet;
use tracing::warn;

use f2fauth_core::{AuthorizationConfig, AuthorizationMode};

use crate::device::Device;
use crate::error::{IdentityError, IdentityResult};

/// Identity of whoever is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// No client key was presented
    Anonymous,
    /// Caller holds the key with this hex SHA-256 fingerprint
    KeyHolder { fingerprint: String },
}

impl Principal {
    pub fn key_holder(fingerprint: impl Into<String>) -> Self {
        Principal::KeyHolder {
            fingerprint: fingerprint.into().to_ascii_lowercase(),
        }
    }

    pub fn fingerprint(&self) -> Option<&str> {
        match self {
            Principal::Anonymous => None,
            Principal::KeyHolder { fingerprint } => Some(fingerprint),
        }
    }
}

/// Decides which principals may administer devices.
#[derive(Debug, Clone)]
pub enum AccessPolicy {
    /// Every caller is treated as an administrator
    PermitAll,
    /// Only holders of one of these key fingerprints are administrators
    Fingerprint { admins: HashSet<String> },
}

impl AccessPolicy {
    pub fn from_config(config: &AuthorizationConfig) -> Self {
        match config.mode {
            AuthorizationMode::PermitAll => AccessPolicy::PermitAll,
            AuthorizationMode::Fingerprint => AccessPolicy::Fingerprint {
                admins: config
                    .admin_fingerprints
                    .iter()
                    .map(|fp| fp.to_ascii_lowercase())
                    .collect(),
            },
        }
    }

    pub fn is_admin(&self, principal: &Principal) -> bool {
        match self {
            AccessPolicy::PermitAll => true,
            AccessPolicy::Fingerprint { admins } => principal
                .fingerprint()
                .map(|fp| admins.contains(fp))
                .unwrap_or(false),
        }
    }

    /// True when the principal holds the key bound to `device`.
    pub fn is_same_identity(&self, principal: &Principal, device: &Device) -> bool {
        let bound = device.public_key_fingerprint();
        match principal.fingerprint() {
            Some(fp) => !bound.is_empty() && fp == bound,
            None => false,
        }
    }

    pub fn require_admin(&self, principal: &Principal, operation: &str) -> IdentityResult<()> {
        if self.is_admin(principal) {
            return Ok(());
        }
        warn!(?principal, operation, "Administrator capability required");
        Err(IdentityError::Unauthorized(format!(
            "{} requires administrator",
            operation
        )))
    }

    pub fn require_admin_or_self(
        &self,
        principal: &Principal,
        device: &Device,
    ) -> IdentityResult<()> {
        if self.is_admin(principal) || self.is_same_identity(principal, device) {
            return Ok(());
        }
        warn!(?principal, name = %device.name, "Device read denied");
        Err(IdentityError::Unauthorized(format!(
            "no access to device {}",
            device.name
        )))
    }
}

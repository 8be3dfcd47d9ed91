//! Wiring of store, provisioner, authenticator and access policy.
//!
//! `AuthContext` is the single entry point the server boundary calls. It
//! applies capability checks before delegating to the component that owns
//! the operation.

use std::sync::Arc;
use tracing::info;

use f2fauth_core::{Config, StoreBackend};

use crate::authz::{AccessPolicy, Principal};
use crate::device::Device;
use crate::error::{IdentityError, IdentityResult};
use crate::peer_auth::{AuthAssertion, PeerAuthenticator};
use crate::provisioning::{NameGenerator, Provisioner};
use crate::sqlite_store::SqliteDeviceStore;
use crate::store::{DeviceStore, MemoryDeviceStore};

pub struct AuthContext {
    store: Arc<dyn DeviceStore>,
    provisioner: Provisioner,
    authenticator: PeerAuthenticator,
    policy: AccessPolicy,
}

impl AuthContext {
    pub fn new(
        store: Arc<dyn DeviceStore>,
        realm: impl Into<String>,
        names: NameGenerator,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            provisioner: Provisioner::new(store.clone(), realm, names),
            authenticator: PeerAuthenticator::new(store.clone()),
            store,
            policy,
        }
    }

    /// Open the configured store and build a context over it.
    pub fn from_config(config: &Config) -> IdentityResult<Self> {
        let store: Arc<dyn DeviceStore> = match config.store.backend {
            StoreBackend::Sqlite => Arc::new(SqliteDeviceStore::open(&config.store.db_path)?),
            StoreBackend::Memory => Arc::new(MemoryDeviceStore::new()),
        };

        info!(
            backend = ?config.store.backend,
            realm = %config.identity.realm,
            seeded = config.identity.seed.is_some(),
            authorization = ?config.authorization.mode,
            "Auth context initialised"
        );

        Ok(Self::new(
            store,
            config.identity.realm.clone(),
            NameGenerator::from_config(config.identity.seed),
            AccessPolicy::from_config(&config.authorization),
        ))
    }

    pub fn realm(&self) -> &str {
        self.provisioner.realm()
    }

    pub fn store(&self) -> &Arc<dyn DeviceStore> {
        &self.store
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn provision(&self, principal: &Principal) -> IdentityResult<Device> {
        self.policy.require_admin(principal, "provision")?;
        self.provisioner.provision()
    }

    pub fn finalize(
        &self,
        principal: &Principal,
        name: &str,
        encoded_public_key: &str,
    ) -> IdentityResult<Device> {
        self.policy.require_admin(principal, "finalize")?;
        self.provisioner.finalize(name, encoded_public_key)
    }

    /// Read a device record. Callers without access learn nothing about
    /// whether the name exists.
    pub fn lookup_device(&self, principal: &Principal, name: &str) -> IdentityResult<Device> {
        if name.is_empty() {
            return Err(IdentityError::Validation(
                "Must provide a 'name' parameter".to_string(),
            ));
        }

        let is_admin = self.policy.is_admin(principal);
        match self.store.find_by_name(name) {
            Ok(device) => {
                self.policy.require_admin_or_self(principal, &device)?;
                Ok(device)
            }
            Err(e) => {
                let err = IdentityError::from(e);
                if !is_admin && matches!(err, IdentityError::DeviceNotFound { .. }) {
                    return Err(IdentityError::Unauthorized(format!(
                        "no access to device {}",
                        name
                    )));
                }
                Err(err)
            }
        }
    }

    pub fn issue_credential(&self, assertion: &AuthAssertion) -> IdentityResult<String> {
        self.authenticator.issue_credential(assertion)
    }

    pub fn verify_credential(&self, credential: &str) -> IdentityResult<AuthAssertion> {
        self.authenticator.verify_credential(credential)
    }
}

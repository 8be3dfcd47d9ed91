//! Device identity and face-to-face authentication for F2FAuth.
//!
//! This crate holds the server-side state machine: devices are provisioned
//! with a server-assigned name, finalized by binding an RSA public key, and
//! afterwards authenticate each other in person by exchanging chained
//! signatures that the server turns into a composite credential.
//!
//! # Core Concepts
//!
//! - **Device**: a named identity scoped to a realm, optionally bound to a key
//! - **Device Store**: keyed persistence of device records (memory or SQLite)
//! - **Provisioning**: name assignment and key binding
//! - **Peer Authentication**: `auth1`/`auth2` signature verification and the
//!   six-field composite credential
//! - **Authorization**: which callers may administer or read device records
//!
//! # Security Model
//!
//! - Two distinct finalized devices in the same realm are required for every
//!   credential; a device can never vouch for itself
//! - The peer signs the initiator's signature text, so a peer attestation is
//!   bound to exactly one initiator assertion
//! - Failures are classified by [`ErrorKind`]; details are logged, never
//!   returned to callers except for validation messages

pub mod authz;
pub mod context;
pub mod device;
pub mod error;
pub mod peer_auth;
pub mod provisioning;
pub mod sqlite_store;
pub mod store;

pub use authz::{AccessPolicy, Principal};
pub use context::AuthContext;
pub use device::{Device, DeviceState};
pub use error::{ErrorKind, IdentityError, IdentityResult};
pub use peer_auth::{AuthAssertion, PeerAuthenticator, INITIATOR_TAG, PEER_TAG};
pub use provisioning::{NameGenerator, Provisioner, NAME_ENTROPY_BYTES};
pub use sqlite_store::SqliteDeviceStore;
pub use store::{DeviceStore, MemoryDeviceStore, StoreError, StoreResult};

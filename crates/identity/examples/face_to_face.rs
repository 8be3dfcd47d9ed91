//! Example: Face-to-face authentication
//!
//! Provisions two devices against an in-memory store, finalizes them with
//! freshly generated keys, runs the auth1/auth2 handshake and verifies the
//! resulting composite credential.
//!
//! Usage:
//! ```bash
//! cargo run -p f2fauth-identity --example face_to_face
//! ```

use f2fauth_crypto::DeviceSigner;
use f2fauth_identity::{
    AccessPolicy, AuthAssertion, AuthContext, MemoryDeviceStore, NameGenerator, Principal,
};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let ctx = AuthContext::new(
        Arc::new(MemoryDeviceStore::new()),
        "foo",
        NameGenerator::from_seed(20),
        AccessPolicy::PermitAll,
    );
    let admin = Principal::Anonymous;

    let alice_key = DeviceSigner::generate()?;
    let bob_key = DeviceSigner::generate()?;

    let alice = ctx.provision(&admin)?;
    ctx.finalize(&admin, &alice.name, &alice_key.encoded_public_key())?;
    let bob = ctx.provision(&admin)?;
    ctx.finalize(&admin, &bob.name, &bob_key.encoded_public_key())?;

    tracing::info!(alice = %alice.name, bob = %bob.name, "Devices ready");

    // Alice shows her assertion to Bob, who countersigns it
    let ts = "1000";
    let sig = alice_key.sign_encoded(&AuthAssertion::initiator_message(&alice.name, ts))?;
    let peer_ts = "2000";
    let peer_sig = bob_key.sign_encoded(&AuthAssertion::peer_message(
        &alice.name,
        ts,
        &sig,
        &bob.name,
        peer_ts,
    ))?;

    let credential = ctx.issue_credential(&AuthAssertion {
        name: alice.name.clone(),
        ts: ts.to_string(),
        sig,
        peer_name: bob.name.clone(),
        peer_ts: peer_ts.to_string(),
        peer_sig,
    })?;
    tracing::info!(%credential, "Credential issued");

    let verified = ctx.verify_credential(&credential)?;
    tracing::info!(
        name = %verified.name,
        peer_name = %verified.peer_name,
        "Credential verified"
    );

    Ok(())
}

//! Adversarial Handshakes
//!
//! Attempts to obtain or reuse a credential without two honest devices from
//! the same realm.
//!
//! # Test Scenarios
//!
//! 1. **Lone Device**: one device names itself as its own peer
//! 2. **Realm Crossing**: valid signatures from devices in different realms
//! 3. **Peer Signature Replay**: a peer attestation reused with a new initiator token
//! 4. **Credential Surgery**: a field of an issued credential is swapped
//! 5. **Key Rotation**: a credential outlives the key that signed it
//!
//! Every rejection must look the same to the caller.

use crate::test_utils::{device_name, handshake, signer, TestServer};
use axum::http::StatusCode;
use f2fauth_crypto::encoding::{decode_b64url_raw, encode_b64url_raw};
use f2fauth_identity::AuthAssertion;

#[tokio::test]
async fn test_lone_device_cannot_self_vouch() {
    let server = TestServer::new("foo");
    tracing::info!("Scenario 1: lone device names itself as peer");
    let a = device_name(&server.enroll(signer(0)).await);

    let assertion = handshake(&a, "1000", signer(0), &a, "2000", signer(0));
    let (status, body) = server.refresh(&assertion).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Forbidden");
}

#[tokio::test]
async fn test_realm_crossing_rejected() {
    let foo = TestServer::new("foo");
    let bar = TestServer::sharing(&foo, "bar");
    tracing::info!("Scenario 2: devices from realms foo and bar");

    let a = device_name(&foo.enroll(signer(0)).await);
    let c = bar.enroll(signer(2)).await;
    assert_eq!(c["Realm"], "bar");
    let c = device_name(&c);

    let assertion = handshake(&a, "1000", signer(0), &c, "2000", signer(2));
    let (status, body) = foo.refresh(&assertion).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Forbidden");
}

#[tokio::test]
async fn test_peer_signature_replay_rejected() {
    let server = TestServer::new("foo");
    tracing::info!("Scenario 3: peer attestation replayed with a new token");
    let a = device_name(&server.enroll(signer(0)).await);
    let b = device_name(&server.enroll(signer(1)).await);

    let original = handshake(&a, "1000", signer(0), &b, "2000", signer(1));
    let (status, _) = server.refresh(&original).await;
    assert_eq!(status, StatusCode::OK);

    let fresh_sig = signer(0)
        .sign_encoded(&AuthAssertion::initiator_message(&a, "9999"))
        .unwrap();
    let replayed = AuthAssertion {
        ts: "9999".to_string(),
        sig: fresh_sig,
        ..original
    };

    let (status, _) = server.refresh(&replayed).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_credential_surgery_rejected() {
    let server = TestServer::new("foo");
    tracing::info!("Scenario 4: issued credential edited in transit");
    let a = device_name(&server.enroll(signer(0)).await);
    let b = device_name(&server.enroll(signer(1)).await);

    let (_, credential) = server
        .refresh(&handshake(&a, "1000", signer(0), &b, "2000", signer(1)))
        .await;

    let raw = decode_b64url_raw("credential", &credential).unwrap();
    let text = String::from_utf8(raw).unwrap();
    let tampered = text.replacen("|2000|", "|2001|", 1);
    assert_ne!(tampered, text);

    let (status, _) = server
        .check_credential(&encode_b64url_raw(tampered.as_bytes()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let truncated = text.rsplit_once('|').map(|(head, _)| head).unwrap();
    let (status, _) = server
        .check_credential(&encode_b64url_raw(truncated.as_bytes()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_key_rotation_revokes_old_credentials() {
    let server = TestServer::new("foo");
    tracing::info!("Scenario 5: initiator key replaced after issuance");
    let a = device_name(&server.enroll(signer(0)).await);
    let b = device_name(&server.enroll(signer(1)).await);

    let (_, credential) = server
        .refresh(&handshake(&a, "1000", signer(0), &b, "2000", signer(1)))
        .await;
    let (status, _) = server.check_credential(&credential).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .post(&format!(
            "/provision/finalize?name={}&pk={}",
            a,
            signer(3).encoded_public_key()
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.check_credential(&credential).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_initiator_is_404() {
    let server = TestServer::new("foo");
    let b = device_name(&server.enroll(signer(1)).await);

    let assertion = handshake("ghost", "1000", signer(0), &b, "2000", signer(1));
    let (status, body) = server.refresh(&assertion).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not Found");
}

//! Full request flows against the router over a SQLite store.

use crate::test_utils::{device_name, handshake, signer, TestServer, FINGERPRINT_HEADER};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use f2fauth_core::AuthorizationMode;
use serde_json::Value;

#[tokio::test]
async fn test_two_devices_obtain_and_reuse_credential() {
    let server = TestServer::new("foo");
    tracing::info!("Step 1: Enrolling two devices in realm foo");
    let a = device_name(&server.enroll(signer(0)).await);
    let b = device_name(&server.enroll(signer(1)).await);

    tracing::info!("Step 2: Exchanging signatures and requesting a credential");
    let assertion = handshake(&a, "1000", signer(0), &b, "2000", signer(1));
    let (status, credential) = server.refresh(&assertion).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!credential.contains('='));

    tracing::info!("Step 3: Presenting the credential repeatedly");
    for _ in 0..3 {
        let (status, body) = server.check_credential(&credential).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }
}

#[tokio::test]
async fn test_finalized_record_is_readable() {
    let server = TestServer::new("foo");
    let device = server.enroll(signer(0)).await;
    let name = device_name(&device);

    let (status, body) = server.get(&format!("/devices?name={}", name)).await;
    assert_eq!(status, StatusCode::OK);

    let fetched: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(fetched["Realm"], "foo");
    assert_eq!(fetched["PublicKey"], signer(0).encoded_public_key());
    assert_eq!(fetched["PublicKeyFingerprint"], signer(0).fingerprint());
    assert_eq!(fetched, device);
}

#[tokio::test]
async fn test_missing_name_parameter() {
    let server = TestServer::new("foo");

    let (status, body) = server.get("/devices").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Must provide a 'name' parameter");
}

#[tokio::test]
async fn test_delimiter_in_token_is_400() {
    let server = TestServer::new("foo");
    let a = device_name(&server.enroll(signer(0)).await);
    let b = device_name(&server.enroll(signer(1)).await);

    let mut assertion = handshake(&a, "10|00", signer(0), &b, "2000", signer(1));
    // query strings carry '|' percent-encoded
    assertion.ts = "10%7C00".to_string();
    let (status, body) = server.refresh(&assertion).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Malformed 'ts' parameter");
}

#[tokio::test]
async fn test_empty_key_leaves_device_provisioned() {
    let server = TestServer::new("foo");
    let (_, body) = server.post("/provision").await;
    let name = device_name(&serde_json::from_str(&body).unwrap());

    let (status, body) = server
        .post(&format!("/provision/finalize?name={}&pk=", name))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Must provide a 'pk' parameter");

    let (_, body) = server.get(&format!("/devices?name={}", name)).await;
    let device: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(device["PublicKey"], "");
    assert_eq!(device["PublicKeyFingerprint"], "");
}

#[tokio::test]
async fn test_finalize_unknown_device_is_404() {
    let server = TestServer::new("foo");
    let (status, body) = server
        .post(&format!(
            "/provision/finalize?name=nobody&pk={}",
            signer(0).encoded_public_key()
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not Found");
}

#[tokio::test]
async fn test_device_reads_own_record_under_fingerprint_policy() {
    let admin = signer(3).fingerprint();
    let server = TestServer::with_config("foo", |config| {
        config.authorization.mode = AuthorizationMode::Fingerprint;
        config.authorization.admin_fingerprints = vec![admin.clone()];
    });

    let provision = Request::builder()
        .method("POST")
        .uri("/provision")
        .header(FINGERPRINT_HEADER, &admin)
        .body(Body::empty())
        .unwrap();
    let (status, body) = server.send(provision).await;
    assert_eq!(status, StatusCode::OK);
    let name = device_name(&serde_json::from_str(&body).unwrap());

    let finalize = Request::builder()
        .method("POST")
        .uri(format!(
            "/provision/finalize?name={}&pk={}",
            name,
            signer(0).encoded_public_key()
        ))
        .header(FINGERPRINT_HEADER, &admin)
        .body(Body::empty())
        .unwrap();
    let (status, _) = server.send(finalize).await;
    assert_eq!(status, StatusCode::OK);

    let lookup = |fingerprint: String| {
        Request::builder()
            .uri(format!("/devices?name={}", name))
            .header(FINGERPRINT_HEADER, fingerprint)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = server.send(lookup(signer(0).fingerprint())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server.send(lookup(signer(1).fingerprint())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Forbidden");

    let (status, _) = server.post("/provision").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

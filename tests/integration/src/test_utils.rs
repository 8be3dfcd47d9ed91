//! Test utilities for HTTP boundary integration tests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use f2fauth_core::{Config, StoreBackend};
use f2fauth_crypto::DeviceSigner;
use f2fauth_identity::AuthAssertion;
use f2fauth_server::{router, AppState};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;

/// Header the TLS terminator sets with the client certificate fingerprint
pub const FINGERPRINT_HEADER: &str = "X-Client-Cert-Fingerprint";

/// Install a test-friendly subscriber once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("f2fauth=debug")
        .try_init();
}

/// Shared device keys; RSA generation is slow, so generate once
pub fn signer(index: usize) -> &'static DeviceSigner {
    static SIGNERS: OnceLock<Vec<DeviceSigner>> = OnceLock::new();
    &SIGNERS.get_or_init(|| {
        (0..4)
            .map(|_| DeviceSigner::generate_with_bits(1024).unwrap())
            .collect()
    })[index]
}

/// Router over a fresh SQLite database in the temp directory
pub struct TestServer {
    pub app: Router,
    pub db_path: PathBuf,
    owns_db: bool,
}

impl TestServer {
    pub fn new(realm: &str) -> Self {
        let db_path =
            std::env::temp_dir().join(format!("test_f2fauth_{}.db", uuid::Uuid::new_v4()));
        Self::build(realm, db_path, true, |_| {})
    }

    /// Second server in another realm over the same database
    pub fn sharing(other: &TestServer, realm: &str) -> Self {
        Self::build(realm, other.db_path.clone(), false, |_| {})
    }

    pub fn with_config<F: FnOnce(&mut Config)>(realm: &str, configure: F) -> Self {
        let db_path =
            std::env::temp_dir().join(format!("test_f2fauth_{}.db", uuid::Uuid::new_v4()));
        Self::build(realm, db_path, true, configure)
    }

    fn build<F: FnOnce(&mut Config)>(
        realm: &str,
        db_path: PathBuf,
        owns_db: bool,
        configure: F,
    ) -> Self {
        init_tracing();

        let mut config = Config::default_config();
        config.store.backend = StoreBackend::Sqlite;
        config.store.db_path = db_path.display().to_string();
        config.identity.realm = realm.to_string();
        configure(&mut config);
        config.validate().unwrap();

        let state = Arc::new(AppState::from_config(&config).unwrap());
        Self {
            app: router(state),
            db_path,
            owns_db,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str) -> (StatusCode, String) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Provision a device and finalize it with `signer`, returning its record
    pub async fn enroll(&self, signer: &DeviceSigner) -> Value {
        let (status, body) = self.post("/provision").await;
        assert_eq!(status, StatusCode::OK, "provision failed: {}", body);
        let device: Value = serde_json::from_str(&body).unwrap();
        let name = device["Name"].as_str().unwrap();

        let (status, body) = self
            .post(&format!(
                "/provision/finalize?name={}&pk={}",
                name,
                signer.encoded_public_key()
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "finalize failed: {}", body);
        tracing::info!(name = %name, fingerprint = %signer.fingerprint(), "Test device enrolled");
        serde_json::from_str(&body).unwrap()
    }

    pub async fn refresh(&self, assertion: &AuthAssertion) -> (StatusCode, String) {
        self.get(&format!(
            "/refresh?name={}&ts={}&sig={}&peerName={}&peerTs={}&peerSig={}",
            assertion.name,
            assertion.ts,
            assertion.sig,
            assertion.peer_name,
            assertion.peer_ts,
            assertion.peer_sig
        ))
        .await
    }

    pub async fn check_credential(&self, credential: &str) -> (StatusCode, String) {
        self.send(
            Request::builder()
                .uri("/test")
                .header("Authentication", credential)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.owns_db {
            std::fs::remove_file(&self.db_path).ok();
            std::fs::remove_file(self.db_path.with_extension("db-wal")).ok();
            std::fs::remove_file(self.db_path.with_extension("db-shm")).ok();
        }
    }
}

/// Run the two-device handshake and return the six fields
pub fn handshake(
    name: &str,
    ts: &str,
    initiator: &DeviceSigner,
    peer_name: &str,
    peer_ts: &str,
    peer: &DeviceSigner,
) -> AuthAssertion {
    let sig = initiator
        .sign_encoded(&AuthAssertion::initiator_message(name, ts))
        .unwrap();
    let peer_sig = peer
        .sign_encoded(&AuthAssertion::peer_message(
            name, ts, &sig, peer_name, peer_ts,
        ))
        .unwrap();
    AuthAssertion {
        name: name.to_string(),
        ts: ts.to_string(),
        sig,
        peer_name: peer_name.to_string(),
        peer_ts: peer_ts.to_string(),
        peer_sig,
    }
}

/// Device name from a record returned by the server
pub fn device_name(device: &Value) -> String {
    device["Name"].as_str().unwrap_or_default().to_string()
}

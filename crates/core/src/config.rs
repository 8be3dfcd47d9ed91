//! Configuration management for F2FAuth.
//!
//! Configuration is loaded from a TOML file, then selected keys may be
//! overridden from the environment (`F2FAUTH_*`). Every section has defaults
//! matching a single-node development deployment, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Environment variable overriding `server.addr`.
pub const ENV_ADDR: &str = "F2FAUTH_ADDR";
/// Environment variable overriding `store.db_path`.
pub const ENV_DB_PATH: &str = "F2FAUTH_DB_PATH";
/// Environment variable overriding `identity.realm`.
pub const ENV_REALM: &str = "F2FAUTH_REALM";
/// Environment variable overriding `identity.seed`.
pub const ENV_SEED: &str = "F2FAUTH_SEED";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "F2FAUTH_LOG_LEVEL";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub identity: IdentityConfig,
    pub authorization: AuthorizationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. `[::1]:8080`
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "[::1]:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// File-backed SQLite database at `db_path`
    Sqlite,
    /// Process-local map, lost on restart
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            db_path: "/tmp/auth.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Realm stamped on every device provisioned by this server
    pub realm: String,
    /// Seed for the device-name generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            realm: "foo".to_string(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationMode {
    /// Every caller is treated as an administrator
    PermitAll,
    /// Callers are classified by their client key fingerprint
    Fingerprint,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthorizationConfig {
    pub mode: AuthorizationMode,
    /// Lowercase hex SHA-256 fingerprints of administrator client keys
    pub admin_fingerprints: Vec<String>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            mode: AuthorizationMode::PermitAll,
            admin_fingerprints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Apply `F2FAUTH_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_ADDR) {
            self.server.addr = addr;
        }
        if let Some(db_path) = lookup(ENV_DB_PATH) {
            self.store.db_path = db_path;
        }
        if let Some(realm) = lookup(ENV_REALM) {
            self.identity.realm = realm;
        }
        if let Some(seed) = lookup(ENV_SEED) {
            let seed = seed
                .parse::<u64>()
                .map_err(|e| CoreError::Config(format!("{} must be a u64: {}", ENV_SEED, e)))?;
            self.identity.seed = Some(seed);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        if self.identity.realm.is_empty() {
            return Err(CoreError::Config("identity.realm must not be empty".into()));
        }

        if self.store.backend == StoreBackend::Sqlite && self.store.db_path.is_empty() {
            return Err(CoreError::Config(
                "store.db_path must be set for the sqlite backend".into(),
            ));
        }

        for fp in &self.authorization.admin_fingerprints {
            let well_formed = fp.len() == 64
                && hex::decode(fp).is_ok()
                && !fp.chars().any(|c| c.is_ascii_uppercase());
            if !well_formed {
                return Err(CoreError::Config(format!(
                    "authorization.admin_fingerprints entry '{}' is not a lowercase SHA-256 hex digest",
                    fp
                )));
            }
        }

        if self.authorization.mode == AuthorizationMode::Fingerprint
            && self.authorization.admin_fingerprints.is_empty()
        {
            tracing::warn!("fingerprint authorization enabled with no administrators configured");
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server.addr.parse().map_err(|e| {
            CoreError::Config(format!("server.addr '{}' is invalid: {}", self.server.addr, e))
        })
    }
}

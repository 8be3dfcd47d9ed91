//! Core functionality for the F2FAuth face-to-face authentication server.
//!
//! This crate provides the configuration model, logging initialisation and
//! base error type shared by the crypto, identity and server crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    AuthorizationConfig, AuthorizationMode, Config, IdentityConfig, LoggingConfig, ServerConfig,
    StoreBackend, StoreConfig,
};
pub use error::{CoreError, Error, Result};

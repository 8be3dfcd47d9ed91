//! HTTP boundary for the F2FAuth identity service.
//!
//! Handlers only translate between HTTP and [`f2fauth_identity::AuthContext`];
//! every decision is made in the identity crate.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::hello))
        .route("/health", get(handlers::health_check))
        .route("/realm", get(handlers::realm))
        .route(
            "/provision",
            post(handlers::provision).get(handlers::provision_get),
        )
        .route("/provision/finalize", post(handlers::finalize))
        .route("/devices", get(handlers::get_device))
        .route("/refresh", get(handlers::refresh))
        .route("/test", get(handlers::test_credential))
        .with_state(state)
        .layer(ServiceBuilder::new().into_inner())
}

use axum::{
    extract::{Form, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use f2fauth_identity::{AuthAssertion, Device, ErrorKind, IdentityError, Principal};

use crate::state::AppState;

/// Header carrying the verified client certificate fingerprint, set by the
/// TLS terminator in front of this service.
pub const CLIENT_FINGERPRINT_HEADER: &str = "x-client-cert-fingerprint";

/// Header carrying a composite credential.
pub const CREDENTIAL_HEADER: &str = "authentication";

/// Identity failure rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub IdentityError);

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        ApiError(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::MalformedCredential => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AuthenticationFailed | ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(error = %self.0, status = status.as_u16(), "Request rejected");
        }
        (status, self.0.public_message()).into_response()
    }
}

fn principal(headers: &HeaderMap) -> Principal {
    match headers
        .get(CLIENT_FINGERPRINT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
    {
        Some(fp) if !fp.is_empty() => Principal::key_holder(fp),
        _ => Principal::Anonymous,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FinalizeParams {
    pub name: String,
    pub pk: String,
}

impl FinalizeParams {
    /// Query values take precedence over form body values.
    fn merge(self, form: Option<FinalizeParams>) -> Self {
        let form = form.unwrap_or_default();
        FinalizeParams {
            name: if self.name.is_empty() { form.name } else { self.name },
            pk: if self.pk.is_empty() { form.pk } else { self.pk },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeviceQuery {
    pub name: String,
}

pub async fn hello() -> &'static str {
    "Hello, world!\n"
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "f2fauth-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn realm(State(state): State<Arc<AppState>>) -> String {
    state.context.realm().to_string()
}

pub async fn provision(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Device>, ApiError> {
    let device = state.context.provision(&principal(&headers))?;
    Ok(Json(device))
}

pub async fn provision_get() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, "No GET handler")
}

pub async fn finalize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FinalizeParams>,
    form: Option<Form<FinalizeParams>>,
) -> Result<Json<Device>, ApiError> {
    let params = query.merge(form.map(|Form(f)| f));
    let device = state
        .context
        .finalize(&principal(&headers), &params.name, &params.pk)?;
    Ok(Json(device))
}

pub async fn get_device(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<Device>, ApiError> {
    let device = state
        .context
        .lookup_device(&principal(&headers), &query.name)?;
    Ok(Json(device))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Query(assertion): Query<AuthAssertion>,
) -> Result<String, ApiError> {
    let credential = state.context.issue_credential(&assertion)?;
    Ok(credential)
}

pub async fn test_credential(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<&'static str, ApiError> {
    let credential = headers
        .get(CREDENTIAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let assertion = state.context.verify_credential(credential)?;
    info!(
        name = %assertion.name,
        peer_name = %assertion.peer_name,
        "Credential accepted"
    );
    Ok("OK")
}

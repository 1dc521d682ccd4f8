//! Admin gate middleware.
//!
//! Registering connections is guarded at the HTTP boundary. The check itself
//! is an injectable [`AdminGate`]; the registry and dispatcher never perform
//! authorization.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;

/// Query parameter carrying the admin secret on form routes.
pub const PASSWORD_PARAM: &str = "password";

/// Decides whether a presented credential grants admin access.
pub trait AdminGate: Send + Sync {
    /// Returns true when `credential` is accepted.
    fn authorize(&self, credential: Option<&str>) -> bool;
}

/// Plain-text comparison against one configured secret.
///
/// With no secret configured nothing is accepted.
#[derive(Debug, Clone)]
pub struct SharedSecretGate {
    secret: Option<String>,
}

impl SharedSecretGate {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }
}

impl AdminGate for SharedSecretGate {
    fn authorize(&self, credential: Option<&str>) -> bool {
        match (&self.secret, credential) {
            (Some(secret), Some(presented)) => secret == presented,
            _ => false,
        }
    }
}

/// Shared handle to the gate stored in router state.
pub type SharedAdminGate = Arc<dyn AdminGate>;

/// Admin gate middleware handler.
///
/// Reads the credential from `Authorization: Bearer …` or the `password`
/// query parameter and rejects the request with 401 when the gate refuses it.
pub async fn admin_gate_middleware(
    State(gate): State<SharedAdminGate>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let credential = extract_admin_credential(&req);
    if !gate.authorize(credential.as_deref()) {
        tracing::warn!(path = %req.uri().path(), "admin credential rejected");
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(req).await)
}

/// Extract bearer token from Authorization header.
pub fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Bearer token if present, otherwise the `password` query parameter.
pub fn extract_admin_credential(req: &Request<Body>) -> Option<String> {
    if let Some(token) = extract_bearer_token(req) {
        return Some(token.to_string());
    }
    Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(mut params)| params.remove(PASSWORD_PARAM))
}

//! Bearer token authentication.
//!
//! Every route except `/health` sits behind [`require_bearer`]. The presented
//! token is never logged.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::ApiError;

#[derive(Clone)]
pub struct BearerAuth {
    token: Arc<str>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl BearerAuth {
    #[must_use]
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Check a raw `Authorization` header value.
    #[must_use]
    pub fn accepts(&self, authorization: Option<&str>) -> bool {
        authorization
            .and_then(bearer_credentials)
            .is_some_and(|presented| constant_time_eq(presented.as_bytes(), self.token.as_bytes()))
    }
}

/// Token part of `Bearer <token>`; the scheme is case-insensitive.
fn bearer_credentials(value: &str) -> Option<&str> {
    let (scheme, credentials) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credentials = credentials.trim();
    (!credentials.is_empty()).then_some(credentials)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn require_bearer(
    State(auth): State<Arc<BearerAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if auth.accepts(authorization) {
        return next.run(request).await;
    }

    tracing::warn!(
        path = request.uri().path(),
        header_present = authorization.is_some(),
        "Rejected request with invalid bearer token"
    );
    ApiError::Unauthorized.into_response()
}

//! HTTP basic authentication for every route.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use subtle::ConstantTimeEq;

use super::AppState;

/// Username and password accepted by the API
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Compare both fields without short-circuiting on the first mismatch
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        (user_ok & pass_ok).into()
    }
}

/// Decode an `Authorization: Basic ...` header value into (username, password)
fn decode_basic(value: &str) -> Option<(String, String)> {
    let token = value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic")],
        axum::Json(serde_json::json!({ "detail": "Invalid credentials" })),
    )
        .into_response()
}

/// Reject requests without valid basic auth credentials
pub(super) async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(decode_basic)
        .map(|(username, password)| state.credentials.verify(&username, &password))
        .unwrap_or(false);

    if !authorized {
        tracing::warn!("Rejected unauthenticated request to {}", request.uri().path());
        return unauthorized();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify() {
        let credentials = Credentials::new("admin".to_string(), "password".to_string());
        assert!(credentials.verify("admin", "password"));
        assert!(!credentials.verify("admin", "passwor"));
        assert!(!credentials.verify("Admin", "password"));
        assert!(!credentials.verify("", ""));
    }

    #[test]
    fn test_decode_basic() {
        let header = format!("Basic {}", BASE64.encode("admin:pa:ss"));
        assert_eq!(
            decode_basic(&header),
            Some(("admin".to_string(), "pa:ss".to_string()))
        );

        assert_eq!(decode_basic("Bearer abc"), None);
        assert_eq!(decode_basic("Basic !!!not-base64"), None);
        assert_eq!(decode_basic(&format!("Basic {}", BASE64.encode("nocolon"))), None);
    }
}

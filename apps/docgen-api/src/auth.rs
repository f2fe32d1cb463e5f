//! Bearer-token authentication and request context extractors
//!
//! A token is base64 of `"<user id>:<unix seconds>"`. It is accepted
//! while its age is within the configured TTL and the user still exists.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use sha2::{Digest, Sha256};
use shared_types::{Role, User};

use crate::error::ApiError;
use crate::state::AppState;
use crate::users;

pub fn issue_token(user_id: i64, issued_at: i64) -> String {
    BASE64.encode(format!("{}:{}", user_id, issued_at))
}

/// Decode a token into `(user id, issued at)`
pub fn decode_token(token: &str) -> Option<(i64, i64)> {
    let decoded = BASE64.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let parts: Vec<&str> = decoded.split(':').collect();
    if parts.len() != 2 {
        return None;
    }

    let user_id = parts[0].parse().ok()?;
    let issued_at = parts[1].parse().ok()?;
    Some((user_id, issued_at))
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    hash_password(password) == password_hash
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    (!token.is_empty()).then_some(token)
}

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Fail with 403 unless the caller's role passes `capability`
    pub fn require(&self, capability: fn(&Role) -> bool, message: &str) -> Result<(), ApiError> {
        if capability(&self.0.role) {
            Ok(())
        } else {
            tracing::info!(
                "Denied {} ({}): {}",
                self.0.email,
                self.0.role,
                message
            );
            Err(ApiError::Forbidden(message.to_string()))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let (user_id, issued_at) = decode_token(token).ok_or(ApiError::Unauthorized)?;

        if Utc::now().timestamp() - issued_at > state.token_ttl_secs {
            tracing::debug!("Expired token for user {}", user_id);
            return Err(ApiError::Unauthorized);
        }

        let user = users::find_user(&state.db, user_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser(user.into()))
    }
}

/// Client address and user agent recorded in the audit log
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let ip_address = header_text("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .or_else(|| header_text("x-real-ip"))
            .unwrap_or("unknown")
            .to_string();

        let user_agent = header_text(header::USER_AGENT.as_str())
            .unwrap_or("unknown")
            .to_string();

        Self {
            ip_address,
            user_agent,
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientInfo::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    #[test]
    fn test_token_round_trip() {
        let token = issue_token(12, 1_700_000_000);
        assert_eq!(token, BASE64.encode("12:1700000000"));
        assert_eq!(decode_token(&token), Some((12, 1_700_000_000)));
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(decode_token("not base64!"), None);
        assert_eq!(decode_token(&BASE64.encode("12")), None);
        assert_eq!(decode_token(&BASE64.encode("12:3:4")), None);
        assert_eq!(decode_token(&BASE64.encode("abc:1700000000")), None);
        assert_eq!(decode_token(""), None);
    }

    #[test]
    fn test_password_hash() {
        let hash = hash_password("correct horse");
        assert_eq!(hash.len(), 64);
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("Correct horse", &hash));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_client_info() {
        let mut headers = HeaderMap::new();
        let info = ClientInfo::from_headers(&headers);
        assert_eq!(info.ip_address, "unknown");
        assert_eq!(info.user_agent, "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.9"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        let info = ClientInfo::from_headers(&headers);
        assert_eq!(info.ip_address, "10.0.0.1");
        assert_eq!(info.user_agent, "curl/8.0");
    }

    proptest! {
        #[test]
        fn tokens_decode_to_what_was_issued(user_id in 1i64..1_000_000, issued_at in 0i64..4_000_000_000) {
            prop_assert_eq!(decode_token(&issue_token(user_id, issued_at)), Some((user_id, issued_at)));
        }
    }
}

//! JWT session tokens
//!
//! Tokens live for the same windows the client tracks: the short window by
//! default, the long one when "remember me" was chosen.

use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use dihadi_core::{Role, SessionWindows};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// JWT signing and verification keys
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub role: Role,
    /// Whether the long window applies
    #[serde(default)]
    pub remember: bool,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// JWT authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Token creation failed")]
    TokenCreation,
    #[error("Password hashing failed")]
    PasswordHash,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("User no longer exists")]
    UnknownUser,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password",
            ),
            AuthError::TokenCreation => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_creation_failed",
                "Failed to create authentication token",
            ),
            AuthError::PasswordHash => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "password_hash_failed",
                "Failed to process password",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Not authorized, token failed",
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Session expired, please log in again",
            ),
            AuthError::MissingAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "missing_auth_header",
                "Not authorized, no token",
            ),
            AuthError::UnknownUser => (
                StatusCode::UNAUTHORIZED,
                "unknown_user",
                "Not authorized, user not found",
            ),
        };

        let body = Json(json!({
            "error": error_code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct JwtService {
    keys: Arc<Keys>,
    windows: SessionWindows,
}

impl JwtService {
    pub fn new(secret: &str, windows: SessionWindows) -> Self {
        Self {
            keys: Arc::new(Keys::new(secret.as_bytes())),
            windows,
        }
    }

    /// Issue a token for `user_id`
    pub fn issue(&self, user_id: &str, role: Role, remember: bool) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, role, remember, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: &str,
        role: Role,
        remember: bool,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let lifetime = self.windows.duration(remember);
        let expires_at = now + lifetime;
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            remember,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.keys.encoding).map_err(|e| {
            warn!("Failed to encode JWT token: {}", e);
            AuthError::TokenCreation
        })?;

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: lifetime.num_seconds(),
        })
    }

    /// Verify and decode token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token verification failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("windows", &self.windows)
            .finish_non_exhaustive()
    }
}

/// Bearer token from the authorization header
pub fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidToken)
}

/// FromRequestParts implementation for Claims (JWT extraction)
impl<S> FromRequestParts<S> for Claims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts)?;
        app_state.jwt.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn service() -> JwtService {
        JwtService::new("test-secret", SessionWindows::default())
    }

    #[test]
    fn test_token_lifetimes_follow_session_windows() {
        let jwt = service();
        let now = Utc::now();

        let short = jwt.issue_at("u1", Role::Worker, false, now).unwrap();
        assert_eq!(short.expires_in, 30 * 60);
        assert_eq!(short.expires_at, now + Duration::minutes(30));

        let long = jwt.issue_at("u1", Role::Worker, true, now).unwrap();
        assert_eq!(long.expires_in, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_verify_round_trip() {
        let jwt = service();
        let issued = jwt.issue("u1", Role::Employer, false).unwrap();

        let claims = jwt.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Role::Employer);
        assert!(!claims.remember);
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = service();
        let issued = jwt
            .issue_at("u1", Role::Worker, false, Utc::now() - Duration::minutes(31))
            .unwrap();

        assert!(matches!(jwt.verify(&issued.token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let issued = JwtService::new("other", SessionWindows::default())
            .issue("u1", Role::Admin, false)
            .unwrap();

        assert!(matches!(
            service().verify(&issued.token),
            Err(AuthError::InvalidToken)
        ));
    }
}

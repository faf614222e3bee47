//! Authentication and role-based authorization

#[cfg(feature = "sqlite")]
pub mod database;
pub mod handlers;
pub mod jwt;
pub mod users;


use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use dihadi_core::{Role, UserProfile};
use jwt::{AuthError, Claims};
use tracing::{debug, error};

/// Authenticated account, loaded fresh from the user store
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }
}

/// Rejection for authenticated requests
#[derive(Debug)]
pub enum AuthRejection {
    Unauthenticated(AuthError),
    PermissionDenied(PermissionDenied),
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated(e) => e.into_response(),
            AuthRejection::PermissionDenied(e) => e.into_response(),
            AuthRejection::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "internal_error",
                    "message": "Server error",
                })),
            )
                .into_response(),
        }
    }
}

impl From<AuthError> for AuthRejection {
    fn from(e: AuthError) -> Self {
        AuthRejection::Unauthenticated(e)
    }
}

/// Permission denied error with detailed message
#[derive(Debug)]
pub struct PermissionDenied {
    pub required_role: String,
    pub user_id: Option<String>,
}

impl PermissionDenied {
    pub fn new(required_role: &str, user_id: Option<String>) -> Self {
        Self {
            required_role: required_role.to_string(),
            user_id,
        }
    }
}

impl IntoResponse for PermissionDenied {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "error": "permission_denied",
                "message": format!("Access denied: {} role required", self.required_role),
                "required_role": self.required_role,
            })),
        )
            .into_response()
    }
}

/// Implement FromRequestParts for AuthUser (valid token, existing account)
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let claims = Claims::from_request_parts(parts, state).await?;

        match app_state.user_service.get_user(&claims.sub).await {
            Ok(Some(profile)) => Ok(AuthUser(profile)),
            Ok(None) => {
                debug!("Token subject no longer exists: {}", claims.sub);
                Err(AuthError::UnknownUser.into())
            }
            Err(e) => {
                error!("Failed to load authenticated user: {}", e);
                Err(AuthRejection::Internal)
            }
        }
    }
}

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $allowed:expr, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub UserProfile);

        impl<S> FromRequestParts<S> for $name
        where
            AppState: FromRef<S>,
            S: Send + Sync,
        {
            type Rejection = AuthRejection;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &S,
            ) -> Result<Self, Self::Rejection> {
                let AuthUser(profile) = AuthUser::from_request_parts(parts, state).await?;
                let allowed: fn(Role) -> bool = $allowed;

                if allowed(profile.role) {
                    Ok($name(profile))
                } else {
                    debug!(user_id = %profile.id, role = %profile.role, "Role check failed");
                    Err(AuthRejection::PermissionDenied(PermissionDenied::new(
                        $label,
                        Some(profile.id),
                    )))
                }
            }
        }
    };
}

role_extractor!(
    /// Account allowed to publish postings (employer or admin)
    EmployerUser,
    |role| role.can_post_jobs(),
    "employer"
);

role_extractor!(
    /// Account allowed to apply for jobs
    WorkerUser,
    |role| role.can_apply(),
    "worker"
);

role_extractor!(
    /// Admin account
    AdminUser,
    |role| role == Role::Admin,
    "admin"
);

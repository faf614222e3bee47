//! Authentication handlers for registration, login and the own profile

use super::AuthUser;
use crate::error::{ApiResult, AppJson};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use dihadi_core::{
    AuthResponse, LoginRequest, MessageResponse, ProfileUpdate, RegisterRequest, UserProfile,
};
use tracing::info;

/// User registration endpoint
///
/// Creates a worker or employer account and returns a session token for it.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Email already registered"),
        (status = 422, description = "Invalid fields")
    )
)]
pub async fn register_user(
    State(app_state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    info!("User registration attempt: {}", request.email);

    let response = app_state.user_service.register(request).await?;

    info!("User registered successfully: {}", response.user.id);
    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login_user(
    State(app_state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    info!("User login attempt: {}", request.email);

    let response = app_state.user_service.login(request).await?;

    info!("User logged in successfully: {}", response.user.id);
    Ok(Json(response))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_profile(AuthUser(profile): AuthUser) -> Json<UserProfile> {
    Json(profile)
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "Auth",
    security(("bearer_auth" = [])),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Invalid fields")
    )
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    user: AuthUser,
    AppJson(update): AppJson<ProfileUpdate>,
) -> ApiResult<Json<UserProfile>> {
    let profile = app_state
        .user_service
        .update_profile(user.id(), update)
        .await?;
    Ok(Json(profile))
}

/// Logout endpoint
///
/// Tokens are stateless; the client discards its token after this call.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn logout_user(user: AuthUser) -> Json<MessageResponse> {
    info!("User logout: {}", user.id());
    Json(MessageResponse::new("Logged out successfully"))
}

//! Public user profiles

use crate::auth::AuthUser;
use crate::error::{ApiResult, AppJson};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use dihadi_core::{ProfileUpdate, UserProfile};

/// Public profile of any user
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.user_service.profile(&user_id).await?))
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/api/users/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Invalid fields")
    )
)]
pub async fn update_user_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(update): AppJson<ProfileUpdate>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(
        state.user_service.update_profile(user.id(), update).await?,
    ))
}

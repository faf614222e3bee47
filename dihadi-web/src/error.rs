//! API error responses
//!
//! Every failure leaves the server as `{ "error": code, "message": text }`,
//! with field errors added for validation failures.

use crate::auth::jwt::AuthError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dihadi_core::DihadiError;
use serde::Serialize;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DihadiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => e.into_response(),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "bad_request", "message": message })),
            )
                .into_response(),
            ApiError::Domain(e) => domain_response(e),
        }
    }
}

fn domain_response(error: DihadiError) -> Response {
    error.log();

    let (status, code, message) = match &error {
        DihadiError::Validation { errors, .. } => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "validation_failed",
                    "message": "Please correct the highlighted fields",
                    "errors": errors,
                })),
            )
                .into_response();
        }
        DihadiError::NotFound { resource, .. } => {
            (StatusCode::NOT_FOUND, "not_found", resource.clone())
        }
        DihadiError::Conflict { message, .. } => {
            (StatusCode::BAD_REQUEST, "conflict", message.clone())
        }
        DihadiError::Forbidden { message, .. } => {
            (StatusCode::FORBIDDEN, "forbidden", message.clone())
        }
        DihadiError::Authentication { message, .. } => {
            (StatusCode::UNAUTHORIZED, "unauthorized", message.clone())
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Server error".to_string(),
        ),
    };

    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

/// JSON body extractor whose rejections use the API error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

/// Query string extractor with the same rejection format
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

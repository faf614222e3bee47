//! HTTP request handlers for the marketplace API

pub mod health;
pub mod jobs;
pub mod users;
pub mod wages;

pub use health::*;
pub use jobs::*;
pub use users::*;
pub use wages::*;

use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};

/// Fallback for unknown routes
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": "Route not found",
        })),
    )
}

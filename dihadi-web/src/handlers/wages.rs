//! Wage benchmark handlers

use crate::auth::AdminUser;
use crate::error::{ApiResult, AppJson, AppQuery};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use dihadi_core::{DihadiError, NewWage, Validate, WageBenchmark, WageFilter};
use tracing::info;

/// List wage benchmarks
#[utoipa::path(
    get,
    path = "/api/wages",
    tag = "Wages",
    params(
        ("category" = Option<String>, Query, description = "Exact category"),
        ("city" = Option<String>, Query, description = "Case-insensitive substring of the city"),
        ("state" = Option<String>, Query, description = "Case-insensitive substring of the state")
    ),
    responses(
        (status = 200, description = "Matching benchmarks", body = Vec<WageBenchmark>)
    )
)]
pub async fn list_wages(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<WageFilter>,
) -> ApiResult<Json<Vec<WageBenchmark>>> {
    Ok(Json(state.wages.list(&filter).await?))
}

/// Publish a wage benchmark
#[utoipa::path(
    post,
    path = "/api/wages",
    tag = "Wages",
    security(("bearer_auth" = [])),
    request_body = NewWage,
    responses(
        (status = 201, description = "Benchmark created", body = WageBenchmark),
        (status = 403, description = "Admin role required"),
        (status = 422, description = "Invalid fields")
    )
)]
pub async fn create_wage(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(input): AppJson<NewWage>,
) -> ApiResult<(StatusCode, Json<WageBenchmark>)> {
    input
        .validate()
        .into_result()
        .map_err(|errors| DihadiError::validation(errors, "wages"))?;

    let wage = state
        .wages
        .insert(WageBenchmark::new(input, Utc::now()))
        .await?;

    info!(wage_id = %wage.id, admin_id = %admin.id, "Wage benchmark created");
    Ok((StatusCode::CREATED, Json(wage)))
}

//! Route definitions for the marketplace API

use crate::{auth, handlers, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};

/// Create API routes, mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Accounts
        .route("/auth/register", post(auth::handlers::register_user))
        .route("/auth/login", post(auth::handlers::login_user))
        .route("/auth/logout", post(auth::handlers::logout_user))
        .route(
            "/auth/profile",
            get(auth::handlers::get_profile).put(auth::handlers::update_profile),
        )
        .route("/users/profile", put(handlers::update_user_profile))
        .route("/users/{id}", get(handlers::get_user))
        // Jobs and applications
        .route("/jobs", get(handlers::list_jobs).post(handlers::create_job))
        .route("/jobs/{id}", get(handlers::get_job))
        .route("/jobs/{id}/apply", post(handlers::apply_for_job))
        .route(
            "/jobs/{id}/applicants/{applicant_id}",
            put(handlers::update_application_status),
        )
        .route("/jobs/{id}/status", put(handlers::update_job_status))
        // Wage benchmarks
        .route("/wages", get(handlers::list_wages).post(handlers::create_wage))
}

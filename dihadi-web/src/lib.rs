//! Dihadi Web Server
//!
//! REST API of the daily-wage job marketplace: accounts, job postings,
//! applications and regional wage benchmarks.

pub mod auth;
#[cfg(feature = "sqlite")]
pub mod database;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

// Re-export main types
pub use error::{ApiError, ApiResult};
pub use server::DihadiServer;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use dihadi_core::SessionWindows;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Development front-end origins allowed by default
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
    "http://127.0.0.1:5173",
];

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// SQLite database URL; in-memory stores when absent
    pub database_url: Option<String>,
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    /// Admin account seeded at start-up
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Browser origins allowed to call the API
    pub cors_origins: Vec<String>,
    /// Token lifetimes
    pub session: SessionWindows,
}

const DEV_JWT_SECRET: &str = "dihadi-dev-secret-change-in-production";

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            admin_email: None,
            admin_password: None,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            session: SessionWindows::default(),
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("DIHADI_HOST").unwrap_or(defaults.host),
            port: std::env::var("DIHADI_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").ok(),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            admin_email: std::env::var("DIHADI_ADMIN_EMAIL").ok(),
            admin_password: std::env::var("DIHADI_ADMIN_PASSWORD").ok(),
            cors_origins: std::env::var("DIHADI_CORS_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(defaults.cors_origins),
            session: defaults.session,
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Comma-separated origin list
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Domain(#[from] dihadi_core::DihadiError),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

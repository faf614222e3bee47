//! SQLite connection setup

use crate::{WebError, WebResult};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// Open a pool for `database_url`, creating the file and its directory if needed
pub async fn connect(database_url: &str) -> WebResult<SqlitePool> {
    tracing::info!("Connecting to database: {}", database_url);

    let in_memory = database_url.contains(":memory:");
    if !in_memory {
        let db_path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);

        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tracing::info!("Creating database directory: {}", parent.display());
                std::fs::create_dir_all(parent).map_err(|e| {
                    WebError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| WebError::Database(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to an in-memory database is a separate database.
    let max_connections = if in_memory { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|e| {
            tracing::error!("Database connection failed: {}", e);
            WebError::Database(format!("Failed to connect to database: {}", e))
        })?;

    tracing::info!("Database connection established");
    Ok(pool)
}

/// Timestamps are stored as fixed-width RFC 3339 text so they sort lexically
pub(crate) fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|t| t.with_timezone(&Utc))
}

//! Database-backed user storage implementation

use super::users::UserData;
use crate::database::{parse_timestamp, timestamp};
use dihadi_core::{storage_error, DihadiError, DihadiResult, UserLocation, UserProfile};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{error, info};

/// Database user record
#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    phone: Option<String>,
    city: String,
    state: String,
    pincode: String,
    skills: String, // JSON array
    experience: Option<i64>,
    rating: f64,
    completed_jobs: i64,
    created_at: String, // RFC 3339
}

impl UserRecord {
    /// Convert to UserData
    fn into_user_data(self) -> DihadiResult<UserData> {
        let role = self
            .role
            .parse()
            .map_err(|e| storage_error!("Invalid stored role", "users", e))?;
        let skills: Vec<String> = serde_json::from_str(&self.skills)?;
        let created_at = parse_timestamp(&self.created_at)
            .map_err(|e| storage_error!("Invalid stored timestamp", "users", e))?;

        Ok(UserData {
            profile: UserProfile {
                id: self.id,
                name: self.name,
                email: self.email,
                role,
                phone: self.phone,
                location: UserLocation {
                    city: self.city,
                    state: self.state,
                    pincode: self.pincode,
                },
                skills,
                experience: self.experience.and_then(|e| u32::try_from(e).ok()),
                rating: self.rating as f32,
                completed_jobs: u32::try_from(self.completed_jobs).unwrap_or(0),
                created_at,
            },
            password_hash: self.password_hash,
        })
    }
}

const SELECT_USERS: &str = "SELECT id, name, email, password_hash, role, phone, city, state, \
     pincode, skills, experience, rating, completed_jobs, created_at FROM users";

/// Database-backed user store
#[derive(Debug, Clone)]
pub struct DatabaseUserStore {
    pool: SqlitePool,
}

impl DatabaseUserStore {
    /// Create new database user store
    pub async fn new(pool: SqlitePool) -> DihadiResult<Self> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    /// Create database tables
    async fn create_tables(&self) -> DihadiResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                phone TEXT,
                city TEXT NOT NULL DEFAULT '',
                state TEXT NOT NULL DEFAULT '',
                pincode TEXT NOT NULL DEFAULT '',
                skills TEXT NOT NULL DEFAULT '[]',
                experience INTEGER,
                rating REAL NOT NULL DEFAULT 0,
                completed_jobs INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create users table: {}", e);
            storage_error!("Failed to create users table", "users", e)
        })?;

        info!("Users table ready");
        Ok(())
    }

    pub async fn insert(&self, user: UserData) -> DihadiResult<UserData> {
        let profile = &user.profile;
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, phone, city, state,
                               pincode, skills, experience, rating, completed_jobs, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&user.password_hash)
        .bind(profile.role.as_str())
        .bind(&profile.phone)
        .bind(&profile.location.city)
        .bind(&profile.location.state)
        .bind(&profile.location.pincode)
        .bind(serde_json::to_string(&profile.skills)?)
        .bind(profile.experience.map(i64::from))
        .bind(f64::from(profile.rating))
        .bind(i64::from(profile.completed_jobs))
        .bind(timestamp(&profile.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DihadiError::conflict("User already exists", "users"))
            }
            Err(e) => Err(storage_error!("Failed to insert user", "users", e)),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> DihadiResult<Option<UserData>> {
        let record: Option<UserRecord> =
            sqlx::query_as(&format!("{SELECT_USERS} WHERE email = ?"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| storage_error!("Failed to load user", "users", e))?;

        record.map(UserRecord::into_user_data).transpose()
    }

    pub async fn find_by_id(&self, user_id: &str) -> DihadiResult<Option<UserData>> {
        let record: Option<UserRecord> = sqlx::query_as(&format!("{SELECT_USERS} WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to load user", "users", e))?;

        record.map(UserRecord::into_user_data).transpose()
    }

    pub async fn find_many(&self, ids: &[String]) -> DihadiResult<Vec<UserProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(SELECT_USERS);
        query.push(" WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let records: Vec<UserRecord> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to load users", "users", e))?;

        records
            .into_iter()
            .map(|r| r.into_user_data().map(|u| u.profile))
            .collect()
    }

    pub async fn update(&self, user: &UserData) -> DihadiResult<()> {
        let profile = &user.profile;
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, phone = ?, city = ?, state = ?, pincode = ?, skills = ?, experience = ?
            WHERE id = ?
            "#,
        )
        .bind(&profile.name)
        .bind(&profile.phone)
        .bind(&profile.location.city)
        .bind(&profile.location.state)
        .bind(&profile.location.pincode)
        .bind(serde_json::to_string(&profile.skills)?)
        .bind(profile.experience.map(i64::from))
        .bind(&profile.id)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error!("Failed to update user", "users", e))?;

        if result.rows_affected() == 0 {
            return Err(DihadiError::not_found("User not found", "users"));
        }
        Ok(())
    }
}

//! Application state shared by all handlers

use crate::auth::jwt::JwtService;
use crate::auth::users::{UserService, UserStore};
use crate::store::{JobStore, WageStore};
use crate::{WebConfig, WebError, WebResult};
use tracing::{info, warn};

#[cfg(feature = "sqlite")]
use crate::{
    auth::database::DatabaseUserStore,
    store::database::{DatabaseJobStore, DatabaseWageStore},
};

#[derive(Clone, Debug)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Token signing and verification
    pub jwt: JwtService,
    /// Accounts and authentication
    pub user_service: UserService,
    pub jobs: JobStore,
    pub wages: WageStore,
}

impl AppState {
    /// Build the stores named by `config` and seed the admin account
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        config.session.validate()?;
        if config.uses_default_secret() {
            warn!("JWT_SECRET is not set, using the development secret");
        }

        let jwt = JwtService::new(&config.jwt_secret, config.session.clone());
        let (users, jobs, wages) = Self::create_stores(&config).await?;

        let state = Self {
            user_service: UserService::new(users, jwt.clone()),
            jwt,
            jobs,
            wages,
            config,
        };

        if let (Some(email), Some(password)) = (
            state.config.admin_email.as_deref(),
            state.config.admin_password.as_deref(),
        ) {
            state
                .user_service
                .ensure_admin(email, password)
                .await
                .map_err(|e| WebError::Config(format!("Failed to seed admin account: {}", e)))?;
        }

        Ok(state)
    }

    /// In-memory state, used by tests and when no database is configured
    pub fn in_memory(config: WebConfig) -> Self {
        let jwt = JwtService::new(&config.jwt_secret, config.session.clone());
        Self {
            user_service: UserService::new(UserStore::memory(), jwt.clone()),
            jwt,
            jobs: JobStore::memory(),
            wages: WageStore::memory(),
            config,
        }
    }

    #[cfg(feature = "sqlite")]
    async fn create_stores(config: &WebConfig) -> WebResult<(UserStore, JobStore, WageStore)> {
        let Some(database_url) = config.database_url.as_deref() else {
            info!("No DATABASE_URL configured, using in-memory stores");
            return Ok((UserStore::memory(), JobStore::memory(), WageStore::memory()));
        };

        let pool = crate::database::connect(database_url).await?;
        let users = DatabaseUserStore::new(pool.clone()).await?;
        let jobs = DatabaseJobStore::new(pool.clone()).await?;
        let wages = DatabaseWageStore::new(pool).await?;

        info!("Using SQLite stores at {}", database_url);
        Ok((
            UserStore::Database(users),
            JobStore::Database(jobs),
            WageStore::Database(wages),
        ))
    }

    #[cfg(not(feature = "sqlite"))]
    async fn create_stores(config: &WebConfig) -> WebResult<(UserStore, JobStore, WageStore)> {
        if config.database_url.is_some() {
            warn!("DATABASE_URL ignored: built without the sqlite feature");
        }
        Ok((UserStore::memory(), JobStore::memory(), WageStore::memory()))
    }
}

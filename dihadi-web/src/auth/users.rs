//! User management and authentication

#[cfg(feature = "sqlite")]
use super::database::DatabaseUserStore;
use super::jwt::{AuthError, JwtService};
use crate::error::ApiResult;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use dihadi_core::{
    AuthResponse, ContactSummary, DihadiError, DihadiResult, LoginRequest, ProfileUpdate,
    RegisterRequest, Role, UserLocation, UserProfile, Validate,
};
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stored account: the public profile plus its password hash
#[derive(Debug, Clone)]
pub struct UserData {
    pub profile: UserProfile,
    pub password_hash: String,
}

impl UserData {
    /// Create a new account with a hashed password
    pub fn new(
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        phone: Option<String>,
        location: UserLocation,
        skills: Vec<String>,
    ) -> Result<Self, AuthError> {
        let password_hash = hash_password(password)?;

        Ok(Self {
            profile: UserProfile {
                id: Uuid::new_v4().to_string(),
                name: name.trim().to_string(),
                email: normalize_email(email),
                role,
                phone: non_empty(phone),
                location,
                skills: if role == Role::Worker {
                    clean_skills(skills)
                } else {
                    Vec::new()
                },
                experience: None,
                rating: 0.0,
                completed_jobs: 0,
                created_at: Utc::now(),
            },
            password_hash,
        })
    }

    /// Verify password
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash).unwrap_or(false)
    }

    /// Apply a partial update; skills and experience only apply to workers
    pub fn apply_update(&mut self, update: ProfileUpdate) {
        let profile = &mut self.profile;

        if let Some(name) = update.name {
            profile.name = name.trim().to_string();
        }
        if update.phone.is_some() {
            profile.phone = non_empty(update.phone);
        }
        if let Some(location) = update.location {
            profile.location = location;
        }
        if profile.role == Role::Worker {
            if let Some(skills) = update.skills {
                profile.skills = clean_skills(skills);
            }
            if let Some(experience) = update.experience {
                profile.experience = Some(experience);
            }
        }
    }
}

/// User store abstraction supporting both in-memory and database storage
#[derive(Debug, Clone)]
pub enum UserStore {
    /// In-memory storage (for development and testing)
    Memory {
        users: Arc<RwLock<HashMap<String, UserData>>>,
        users_by_email: Arc<RwLock<HashMap<String, String>>>, // email -> user_id
    },
    /// Database storage (for production)
    #[cfg(feature = "sqlite")]
    Database(DatabaseUserStore),
}

impl Default for UserStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl UserStore {
    /// Create in-memory user store
    pub fn memory() -> Self {
        Self::Memory {
            users: Arc::new(RwLock::new(HashMap::new())),
            users_by_email: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a new account; the email must not be taken
    pub async fn insert(&self, user: UserData) -> DihadiResult<UserData> {
        match self {
            Self::Memory {
                users,
                users_by_email,
            } => {
                let mut users = users.write().await;
                let mut users_by_email = users_by_email.write().await;

                if users_by_email.contains_key(&user.profile.email) {
                    debug!("Registration failed: email '{}' exists", user.profile.email);
                    return Err(DihadiError::conflict("User already exists", "users"));
                }

                users_by_email.insert(user.profile.email.clone(), user.profile.id.clone());
                users.insert(user.profile.id.clone(), user.clone());
                Ok(user)
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => db_store.insert(user).await,
        }
    }

    pub async fn find_by_email(&self, email: &str) -> DihadiResult<Option<UserData>> {
        match self {
            Self::Memory {
                users,
                users_by_email,
            } => {
                // Same lock order as insert: users, then users_by_email
                let users = users.read().await;
                let users_by_email = users_by_email.read().await;
                Ok(users_by_email
                    .get(email)
                    .and_then(|id| users.get(id))
                    .cloned())
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => db_store.find_by_email(email).await,
        }
    }

    pub async fn find_by_id(&self, user_id: &str) -> DihadiResult<Option<UserData>> {
        match self {
            Self::Memory { users, .. } => Ok(users.read().await.get(user_id).cloned()),
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => db_store.find_by_id(user_id).await,
        }
    }

    /// Profiles for the given ids; unknown ids are skipped
    pub async fn find_many(&self, ids: &[String]) -> DihadiResult<Vec<UserProfile>> {
        match self {
            Self::Memory { users, .. } => {
                let users = users.read().await;
                Ok(ids
                    .iter()
                    .filter_map(|id| users.get(id))
                    .map(|u| u.profile.clone())
                    .collect())
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => db_store.find_many(ids).await,
        }
    }

    /// Persist changed profile fields of an existing account
    pub async fn update(&self, user: &UserData) -> DihadiResult<()> {
        match self {
            Self::Memory { users, .. } => {
                let mut users = users.write().await;
                match users.get_mut(&user.profile.id) {
                    Some(existing) => {
                        *existing = user.clone();
                        Ok(())
                    }
                    None => Err(DihadiError::not_found("User not found", "users")),
                }
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db_store) => db_store.update(user).await,
        }
    }
}

/// User service for authentication operations
#[derive(Debug, Clone)]
pub struct UserService {
    store: UserStore,
    jwt: JwtService,
}

impl UserService {
    /// Create new user service with custom store
    pub fn new(store: UserStore, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    /// Register a worker or employer account and sign a token for it
    pub async fn register(&self, request: RegisterRequest) -> ApiResult<AuthResponse> {
        debug!("Starting user registration for: {}", request.email);
        request
            .validate()
            .into_result()
            .map_err(|errors| DihadiError::validation(errors, "users"))?;

        let user = UserData::new(
            &request.name,
            &request.email,
            &request.password,
            request.role,
            request.phone,
            request.location.unwrap_or_default(),
            request.skills,
        )?;
        let user = self.store.insert(user).await?;

        info!(user_id = %user.profile.id, role = %user.profile.role, "Registered new user");
        Ok(self.auth_response(&user.profile, request.remember_me)?)
    }

    /// Check credentials and sign a token
    pub async fn login(&self, request: LoginRequest) -> ApiResult<AuthResponse> {
        request
            .validate()
            .into_result()
            .map_err(|errors| DihadiError::validation(errors, "users"))?;

        let user = self
            .store
            .find_by_email(&normalize_email(&request.email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.verify_password(&request.password) {
            warn!("Invalid password for user: {}", user.profile.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        debug!("User authenticated: {}", user.profile.id);
        Ok(self.auth_response(&user.profile, request.remember_me)?)
    }

    /// Full profile of an account
    pub async fn profile(&self, user_id: &str) -> ApiResult<UserProfile> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(|u| u.profile)
            .ok_or_else(|| DihadiError::not_found("User not found", "users").into())
    }

    /// Profile lookup that treats a missing account as absent
    pub async fn get_user(&self, user_id: &str) -> DihadiResult<Option<UserProfile>> {
        Ok(self.store.find_by_id(user_id).await?.map(|u| u.profile))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> ApiResult<UserProfile> {
        update
            .validate()
            .into_result()
            .map_err(|errors| DihadiError::validation(errors, "users"))?;

        let mut user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DihadiError::not_found("User not found", "users"))?;

        user.apply_update(update);
        self.store.update(&user).await?;

        debug!("Updated profile for user: {}", user_id);
        Ok(user.profile)
    }

    /// Contact summaries keyed by user id
    pub async fn contacts(&self, ids: &[String]) -> DihadiResult<HashMap<String, ContactSummary>> {
        let profiles = self.store.find_many(ids).await?;
        Ok(profiles
            .into_iter()
            .map(|p| (p.id.clone(), p.contact()))
            .collect())
    }

    /// Create the configured admin account unless it already exists
    pub async fn ensure_admin(&self, email: &str, password: &str) -> ApiResult<()> {
        let email = normalize_email(email);
        if self.store.find_by_email(&email).await?.is_some() {
            debug!("Admin account already present");
            return Ok(());
        }

        let admin = UserData::new(
            "Administrator",
            &email,
            password,
            Role::Admin,
            None,
            UserLocation::default(),
            Vec::new(),
        )?;
        self.store.insert(admin).await?;

        info!("Created admin account: {}", email);
        Ok(())
    }

    fn auth_response(
        &self,
        profile: &UserProfile,
        remember: bool,
    ) -> Result<AuthResponse, AuthError> {
        let issued = self.jwt.issue(&profile.id, profile.role, remember)?;
        Ok(AuthResponse {
            user: profile.summary(),
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            expires_at: issued.expires_at,
        })
    }

    /// Get user store (for testing)
    pub fn store(&self) -> &UserStore {
        &self.store
    }
}

/// Emails are matched case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_skills(skills: Vec<String>) -> Vec<String> {
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Hash password using Argon2
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify password against hash
fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

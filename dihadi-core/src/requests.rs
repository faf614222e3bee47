//! Request and response payloads of the REST API

use crate::types::{
    ApplicantStatus, JobCategory, JobLocation, JobStatus, Role, UserLocation, UserSummary, Wage,
    WageLocation,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Account registration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<UserLocation>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Issue a long-lived token
    #[serde(default)]
    pub remember_me: bool,
}

/// Credentials for login
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AuthResponse {
    pub user: UserSummary,
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<UserLocation>,
    /// Ignored for non-worker accounts
    pub skills: Option<Vec<String>>,
    /// Years of experience; ignored for non-worker accounts
    pub experience: Option<u32>,
}

/// A new job posting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    #[serde(default)]
    pub location: JobLocation,
    pub wage: Wage,
    pub duration: String,
    #[serde(default)]
    pub workers_needed: Option<u32>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// A new wage benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NewWage {
    pub category: String,
    #[serde(default)]
    pub location: WageLocation,
    pub average_wage: f64,
    #[serde(default)]
    pub min_wage: Option<f64>,
    #[serde(default)]
    pub max_wage: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Employer decision on an application
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ApplicationStatusUpdate {
    pub status: ApplicantStatus,
}

/// Employer-driven posting status change
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct JobStatusUpdate {
    pub status: JobStatus,
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

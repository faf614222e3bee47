//! OpenAPI specification for the Dihadi API

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::HealthResponse;
use dihadi_core::{
    Applicant, ApplicantStatus, ApplicationStatusUpdate, AuthResponse, ContactSummary, FormErrors,
    Job, JobCategory, JobLocation, JobStatus, JobStatusUpdate, LoginRequest, MessageResponse,
    NewJob, NewWage, ProfileUpdate, RegisterRequest, Role, UserLocation, UserProfile, UserSummary,
    Wage, WageBenchmark, WageLocation, WageUnit,
};

/// Main OpenAPI specification for the Dihadi web server
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dihadi API",
        version = "0.1.0",
        description = "Daily-wage job marketplace: accounts, job postings, applications and wage benchmarks",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        // Health endpoints
        crate::handlers::health_check,

        // Accounts
        crate::auth::handlers::register_user,
        crate::auth::handlers::login_user,
        crate::auth::handlers::get_profile,
        crate::auth::handlers::update_profile,
        crate::auth::handlers::logout_user,
        crate::handlers::get_user,
        crate::handlers::update_user_profile,

        // Jobs
        crate::handlers::list_jobs,
        crate::handlers::create_job,
        crate::handlers::get_job,
        crate::handlers::apply_for_job,
        crate::handlers::update_application_status,
        crate::handlers::update_job_status,

        // Wages
        crate::handlers::list_wages,
        crate::handlers::create_wage,
    ),
    components(
        schemas(
            HealthResponse,
            Role,
            UserLocation,
            UserProfile,
            UserSummary,
            ContactSummary,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            ProfileUpdate,
            MessageResponse,
            FormErrors,
            JobCategory,
            JobLocation,
            JobStatus,
            Wage,
            WageUnit,
            Job,
            Applicant,
            ApplicantStatus,
            NewJob,
            ApplicationStatusUpdate,
            JobStatusUpdate,
            WageLocation,
            WageBenchmark,
            NewWage,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and the own profile"),
        (name = "Users", description = "User profiles"),
        (name = "Jobs", description = "Job postings and applications"),
        (name = "Wages", description = "Regional wage benchmarks"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Bearer token security scheme
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Get the OpenAPI specification as JSON
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

//! REST client for the Dihadi API
//!
//! Successful logins feed the [`AuthContext`]. A 401 on an authorized call
//! ends the session; other failures surface as an error notice and leave the
//! session untouched. Nothing is retried.

use crate::auth_context::{AuthContext, NoticeLevel};
use crate::error::{ClientError, ClientResult};
use dihadi_core::{
    Applicant, ApplicantStatus, ApplicationStatusUpdate, AuthResponse, FormErrors, Job, JobFilter,
    JobStatus, JobStatusUpdate, LoginRequest, MessageResponse, NewJob, NewWage, ProfileUpdate,
    RegisterRequest, UserProfile, Validate, WageBenchmark, WageFilter,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body returned by the server
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Option<FormErrors>,
}

/// Health check payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<AuthContext>,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`
    pub fn new(base_url: impl Into<String>, auth: Arc<AuthContext>) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(http, base_url, auth))
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        auth: Arc<AuthContext>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn auth(&self) -> &Arc<AuthContext> {
        &self.auth
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    pub async fn health(&self) -> ClientResult<HealthStatus> {
        self.send(self.request(Method::GET, "/health"), false).await
    }

    /// Register and start a session for the new account
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse> {
        check(request)?;
        let response: AuthResponse = self
            .send(
                self.request(Method::POST, "/auth/register").json(request),
                false,
            )
            .await?;

        self.auth
            .login(response.user.clone(), &response.token, request.remember_me)
            .await?;
        Ok(response)
    }

    pub async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        check(request)?;
        let response: AuthResponse = self
            .send(self.request(Method::POST, "/auth/login").json(request), false)
            .await?;

        self.auth
            .login(response.user.clone(), &response.token, request.remember_me)
            .await?;
        Ok(response)
    }

    /// Tell the server, then end the local session whatever it answered
    pub async fn logout(&self) {
        if self.auth.token().await.is_some() {
            let result: ClientResult<MessageResponse> = self
                .send_quiet(self.request(Method::POST, "/auth/logout"))
                .await;
            if let Err(e) = result {
                debug!("Server-side logout failed: {}", e);
            }
        }
        self.auth.logout().await;
    }

    pub async fn profile(&self) -> ClientResult<UserProfile> {
        self.send(self.request(Method::GET, "/auth/profile"), true)
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<UserProfile> {
        check(update)?;
        let profile: UserProfile = self
            .send(
                self.request(Method::PUT, "/users/profile").json(update),
                true,
            )
            .await?;

        self.auth.refresh_user(profile.summary()).await?;
        Ok(profile)
    }

    pub async fn user(&self, id: &str) -> ClientResult<UserProfile> {
        self.send(self.request(Method::GET, &format!("/users/{id}")), false)
            .await
    }

    pub async fn list_jobs(&self, filter: &JobFilter) -> ClientResult<Vec<Job>> {
        self.send(self.request(Method::GET, "/jobs").query(filter), false)
            .await
    }

    pub async fn create_job(&self, job: &NewJob) -> ClientResult<Job> {
        check(job)?;
        self.send(self.request(Method::POST, "/jobs").json(job), true)
            .await
    }

    pub async fn job(&self, id: &str) -> ClientResult<Job> {
        self.send(self.request(Method::GET, &format!("/jobs/{id}")), false)
            .await
    }

    pub async fn apply(&self, job_id: &str) -> ClientResult<Applicant> {
        self.send(
            self.request(Method::POST, &format!("/jobs/{job_id}/apply")),
            true,
        )
        .await
    }

    pub async fn set_applicant_status(
        &self,
        job_id: &str,
        applicant_id: &str,
        status: ApplicantStatus,
    ) -> ClientResult<Job> {
        self.send(
            self.request(
                Method::PUT,
                &format!("/jobs/{job_id}/applicants/{applicant_id}"),
            )
            .json(&ApplicationStatusUpdate { status }),
            true,
        )
        .await
    }

    pub async fn set_job_status(&self, job_id: &str, status: JobStatus) -> ClientResult<Job> {
        self.send(
            self.request(Method::PUT, &format!("/jobs/{job_id}/status"))
                .json(&JobStatusUpdate { status }),
            true,
        )
        .await
    }

    pub async fn list_wages(&self, filter: &WageFilter) -> ClientResult<Vec<WageBenchmark>> {
        self.send(self.request(Method::GET, "/wages").query(filter), false)
            .await
    }

    pub async fn create_wage(&self, wage: &NewWage) -> ClientResult<WageBenchmark> {
        check(wage)?;
        self.send(self.request(Method::POST, "/wages").json(wage), true)
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        authorized: bool,
    ) -> ClientResult<T> {
        let result = self.dispatch(request, authorized).await;
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    async fn send_quiet<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        self.dispatch(request, true).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        authorized: bool,
    ) -> ClientResult<T> {
        let request = if authorized {
            let token = self
                .auth
                .token()
                .await
                .ok_or(ClientError::NotAuthenticated)?;
            request.bearer_auth(token)
        } else {
            request
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        if status == StatusCode::UNAUTHORIZED && authorized {
            warn!("Request rejected with 401, ending session");
            self.auth.handle_unauthorized().await;
            return Err(ClientError::Unauthorized);
        }

        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        let message = if body.message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        } else {
            body.message
        };

        Err(ClientError::Api {
            status: status.as_u16(),
            code: body.error,
            message,
            field_errors: body.errors,
        })
    }

    /// Transient notice for a failed call. Expired sessions already notified.
    fn report(&self, error: &ClientError) {
        match error {
            ClientError::Unauthorized | ClientError::Validation(_) => {}
            ClientError::Api {
                field_errors: Some(_),
                ..
            } => {}
            ClientError::Http(e) => {
                warn!("Request failed: {}", e);
                self.auth.notify(
                    NoticeLevel::Error,
                    "Network error. Please check your connection and try again.",
                );
            }
            other => self.auth.notify(NoticeLevel::Error, other.to_string()),
        }
    }
}

/// Reject locally invalid input before sending it
fn check<V: Validate>(input: &V) -> ClientResult<()> {
    input.validate().into_result().map_err(ClientError::Validation)
}

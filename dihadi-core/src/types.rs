//! Marketplace domain types
//!
//! Users, job postings with their applicant sub-records, and regional wage
//! benchmarks. These are shared verbatim by the API server and the client.

use crate::error::{DihadiError, DihadiResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Error returned when parsing an unknown enum value from a query string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Worker,
    Employer,
    Admin,
}

string_enum!(Role, "role", {
    Worker => "worker",
    Employer => "employer",
    Admin => "admin",
});

impl Role {
    /// Employers and admins may publish postings
    pub fn can_post_jobs(&self) -> bool {
        matches!(self, Role::Employer | Role::Admin)
    }

    /// Only workers apply for jobs
    pub fn can_apply(&self) -> bool {
        matches!(self, Role::Worker)
    }

    /// Admin accounts are seeded, never self-registered
    pub fn is_self_registrable(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

/// Job category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum JobCategory {
    Construction,
    Agriculture,
    Domestic,
    Delivery,
    Manufacturing,
    Other,
}

string_enum!(JobCategory, "job category", {
    Construction => "construction",
    Agriculture => "agriculture",
    Domestic => "domestic",
    Delivery => "delivery",
    Manufacturing => "manufacturing",
    Other => "other",
});

/// Unit a wage amount is quoted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum WageUnit {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Fixed,
}

string_enum!(WageUnit, "wage unit", {
    Hourly => "hourly",
    Daily => "daily",
    Weekly => "weekly",
    Fixed => "fixed",
});

/// Overall posting status. Transitions are driven by the owning employer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
    InProgress,
    Completed,
}

string_enum!(JobStatus, "job status", {
    Open => "open",
    Closed => "closed",
    InProgress => "in-progress",
    Completed => "completed",
});

/// Status of a single application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ApplicantStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

string_enum!(ApplicantStatus, "applicant status", {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
});

/// Where a user lives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct UserLocation {
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Where a job takes place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct JobLocation {
    pub city: String,
    pub state: String,
    pub address: String,
}

/// Region a wage benchmark applies to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct WageLocation {
    pub city: String,
    pub state: String,
}

/// Full profile of a registered user, without credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    #[serde(default)]
    pub location: UserLocation,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience: Option<u32>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub completed_jobs: u32,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            phone: self.phone.clone(),
        }
    }

    pub fn contact(&self) -> ContactSummary {
        ContactSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            rating: self.rating,
            skills: if self.role == Role::Worker {
                self.skills.clone()
            } else {
                Vec::new()
            },
        }
    }
}

/// The identity a client keeps alongside its session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
}

/// Contact details populated into job postings for employers and applicants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ContactSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub rating: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
}

/// Wage descriptor of a posting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Wage {
    pub amount: f64,
    #[serde(default)]
    pub unit: WageUnit,
}

/// A worker's application to a posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Applicant {
    pub id: String,
    pub worker_id: String,
    #[serde(default)]
    pub status: ApplicantStatus,
    pub applied_at: DateTime<Utc>,
    /// Populated worker details, present only in detail views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<ContactSummary>,
}

impl Applicant {
    pub fn new(worker_id: &str, applied_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            worker_id: worker_id.to_string(),
            status: ApplicantStatus::Pending,
            applied_at,
            worker: None,
        }
    }
}

/// A job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Job {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    pub employer_id: String,
    #[serde(default)]
    pub location: JobLocation,
    pub wage: Wage,
    pub duration: String,
    pub workers_needed: u32,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub applicants: Vec<Applicant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Populated employer details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer: Option<ContactSummary>,
}

impl Job {
    /// Create a new open posting owned by `employer_id`
    pub fn new(employer_id: &str, posting: crate::requests::NewJob, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: posting.title.trim().to_string(),
            description: posting.description,
            category: posting.category,
            employer_id: employer_id.to_string(),
            location: posting.location,
            wage: posting.wage,
            duration: posting.duration,
            workers_needed: posting.workers_needed.unwrap_or(1),
            requirements: posting
                .requirements
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            start_date: posting.start_date,
            end_date: posting.end_date,
            status: JobStatus::Open,
            applicants: Vec::new(),
            created_at: now,
            updated_at: now,
            employer: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.employer_id == user_id
    }

    pub fn applicant_for_worker(&self, worker_id: &str) -> Option<&Applicant> {
        self.applicants.iter().find(|a| a.worker_id == worker_id)
    }

    /// Record an application, rejecting a second one from the same worker
    pub fn add_applicant(&mut self, worker_id: &str, now: DateTime<Utc>) -> DihadiResult<Applicant> {
        if self.applicant_for_worker(worker_id).is_some() {
            return Err(DihadiError::conflict("Already applied for this job", "jobs"));
        }

        let applicant = Applicant::new(worker_id, now);
        self.applicants.push(applicant.clone());
        self.updated_at = now;
        Ok(applicant)
    }

    pub fn set_applicant_status(
        &mut self,
        applicant_id: &str,
        status: ApplicantStatus,
        now: DateTime<Utc>,
    ) -> DihadiResult<()> {
        let applicant = self
            .applicants
            .iter_mut()
            .find(|a| a.id == applicant_id)
            .ok_or_else(|| DihadiError::not_found("Applicant not found", "jobs"))?;

        applicant.status = status;
        self.updated_at = now;
        Ok(())
    }
}

/// Query filter for job listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct JobFilter {
    pub category: Option<JobCategory>,
    pub status: Option<JobStatus>,
    /// Case-insensitive substring of the job's city
    pub location: Option<String>,
    /// Minimum wage amount, inclusive
    pub min_wage: Option<f64>,
    pub employer: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(category) = self.category {
            if job.category != category {
                return false;
            }
        }
        if let Some(status) = self.status {
            if job.status != status {
                return false;
            }
        }
        if let Some(location) = non_blank(&self.location) {
            if !contains_ignore_case(&job.location.city, location) {
                return false;
            }
        }
        if let Some(min_wage) = self.min_wage {
            if job.wage.amount < min_wage {
                return false;
            }
        }
        if let Some(employer) = non_blank(&self.employer) {
            if job.employer_id != employer {
                return false;
            }
        }
        true
    }
}

/// Regional wage benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WageBenchmark {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub location: WageLocation,
    pub average_wage: f64,
    pub min_wage: Option<f64>,
    pub max_wage: Option<f64>,
    pub currency: String,
    pub last_updated: DateTime<Utc>,
}

pub const DEFAULT_CURRENCY: &str = "INR";

impl WageBenchmark {
    pub fn new(input: crate::requests::NewWage, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category: input.category.trim().to_string(),
            location: input.location,
            average_wage: input.average_wage,
            min_wage: input.min_wage,
            max_wage: input.max_wage,
            currency: input
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            last_updated: now,
        }
    }
}

/// Query filter for wage benchmarks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct WageFilter {
    pub category: Option<String>,
    /// Case-insensitive substring of the city
    pub city: Option<String>,
    /// Case-insensitive substring of the state
    pub state: Option<String>,
}

impl WageFilter {
    pub fn matches(&self, wage: &WageBenchmark) -> bool {
        if let Some(category) = non_blank(&self.category) {
            if wage.category != category {
                return false;
            }
        }
        if let Some(city) = non_blank(&self.city) {
            if !contains_ignore_case(&wage.location.city, city) {
                return false;
            }
        }
        if let Some(state) = non_blank(&self.state) {
            if !contains_ignore_case(&wage.location.state, state) {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::NewJob;

    fn posting(city: &str, amount: f64) -> NewJob {
        NewJob {
            title: "  Mason needed ".to_string(),
            description: "Brick work for a two-storey house".to_string(),
            category: JobCategory::Construction,
            location: JobLocation {
                city: city.to_string(),
                state: "Maharashtra".to_string(),
                address: String::new(),
            },
            wage: Wage {
                amount,
                unit: WageUnit::Daily,
            },
            duration: "2 weeks".to_string(),
            workers_needed: None,
            requirements: vec!["own tools".to_string(), "  ".to_string()],
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_enum_string_forms() {
        assert_eq!(JobStatus::InProgress.as_str(), "in-progress");
        assert_eq!("in-progress".parse::<JobStatus>(), Ok(JobStatus::InProgress));
        assert_eq!(
            serde_json::to_string(&JobStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert!("manager".parse::<Role>().is_err());
        assert_eq!(WageUnit::default(), WageUnit::Daily);
    }

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Employer.can_post_jobs());
        assert!(Role::Admin.can_post_jobs());
        assert!(!Role::Worker.can_post_jobs());
        assert!(Role::Worker.can_apply());
        assert!(!Role::Admin.is_self_registrable());
    }

    #[test]
    fn test_new_job_defaults() {
        let job = Job::new("emp-1", posting("Pune", 700.0), Utc::now());

        assert_eq!(job.title, "Mason needed");
        assert_eq!(job.workers_needed, 1);
        assert_eq!(job.status, JobStatus::Open);
        assert_eq!(job.requirements, vec!["own tools".to_string()]);
        assert!(job.is_owned_by("emp-1"));
    }

    #[test]
    fn test_worker_can_apply_only_once() {
        let mut job = Job::new("emp-1", posting("Pune", 700.0), Utc::now());

        let applicant = job.add_applicant("worker-1", Utc::now()).unwrap();
        assert_eq!(applicant.status, ApplicantStatus::Pending);

        let second = job.add_applicant("worker-1", Utc::now());
        assert!(matches!(second, Err(DihadiError::Conflict { .. })));
        assert_eq!(job.applicants.len(), 1);

        job.add_applicant("worker-2", Utc::now()).unwrap();
        assert_eq!(job.applicants.len(), 2);
    }

    #[test]
    fn test_set_applicant_status() {
        let mut job = Job::new("emp-1", posting("Pune", 700.0), Utc::now());
        let applicant = job.add_applicant("worker-1", Utc::now()).unwrap();

        job.set_applicant_status(&applicant.id, ApplicantStatus::Accepted, Utc::now())
            .unwrap();
        assert_eq!(job.applicants[0].status, ApplicantStatus::Accepted);

        let missing = job.set_applicant_status("nope", ApplicantStatus::Rejected, Utc::now());
        assert!(matches!(missing, Err(DihadiError::NotFound { .. })));
    }

    #[test]
    fn test_job_filter() {
        let job = Job::new("emp-1", posting("Navi Mumbai", 700.0), Utc::now());

        assert!(JobFilter::default().matches(&job));
        assert!(JobFilter {
            location: Some("mumbai".to_string()),
            ..Default::default()
        }
        .matches(&job));
        assert!(!JobFilter {
            location: Some("delhi".to_string()),
            ..Default::default()
        }
        .matches(&job));
        assert!(JobFilter {
            min_wage: Some(700.0),
            ..Default::default()
        }
        .matches(&job));
        assert!(!JobFilter {
            min_wage: Some(700.5),
            ..Default::default()
        }
        .matches(&job));
        assert!(!JobFilter {
            category: Some(JobCategory::Delivery),
            ..Default::default()
        }
        .matches(&job));
        assert!(!JobFilter {
            status: Some(JobStatus::Closed),
            ..Default::default()
        }
        .matches(&job));
    }

    #[test]
    fn test_wage_filter_and_currency_default() {
        let wage = WageBenchmark::new(
            crate::requests::NewWage {
                category: "construction".to_string(),
                location: WageLocation {
                    city: "Jaipur".to_string(),
                    state: "Rajasthan".to_string(),
                },
                average_wage: 600.0,
                min_wage: Some(450.0),
                max_wage: Some(800.0),
                currency: None,
            },
            Utc::now(),
        );

        assert_eq!(wage.currency, DEFAULT_CURRENCY);
        assert!(WageFilter {
            state: Some("rajas".to_string()),
            ..Default::default()
        }
        .matches(&wage));
        assert!(!WageFilter {
            category: Some("domestic".to_string()),
            ..Default::default()
        }
        .matches(&wage));
    }
}

//! Job posting and application handlers

use crate::auth::{EmployerUser, WorkerUser};
use crate::error::{ApiResult, AppJson, AppQuery};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use dihadi_core::{
    Applicant, ApplicationStatusUpdate, DihadiError, Job, JobFilter, JobStatusUpdate, NewJob,
    Validate,
};
use tracing::info;

/// Fill in employer contacts and, for detail views, applicant worker contacts
async fn populate(state: &AppState, jobs: &mut [Job], with_workers: bool) -> ApiResult<()> {
    let mut ids: Vec<String> = jobs.iter().map(|j| j.employer_id.clone()).collect();
    if with_workers {
        ids.extend(
            jobs.iter()
                .flat_map(|j| j.applicants.iter().map(|a| a.worker_id.clone())),
        );
    }
    ids.sort();
    ids.dedup();

    let contacts = state.user_service.contacts(&ids).await?;
    for job in jobs.iter_mut() {
        job.employer = contacts.get(&job.employer_id).cloned();
        if with_workers {
            for applicant in &mut job.applicants {
                applicant.worker = contacts.get(&applicant.worker_id).cloned();
            }
        }
    }
    Ok(())
}

async fn load_owned_job(state: &AppState, job_id: &str, user_id: &str) -> ApiResult<Job> {
    let job = state
        .jobs
        .get(job_id)
        .await?
        .ok_or_else(|| DihadiError::not_found("Job not found", "jobs"))?;

    if !job.is_owned_by(user_id) {
        return Err(DihadiError::forbidden("Not authorized to manage this job", "jobs").into());
    }
    Ok(job)
}

/// List job postings
#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "Jobs",
    params(
        ("category" = Option<String>, Query, description = "Exact job category"),
        ("status" = Option<String>, Query, description = "Exact job status"),
        ("location" = Option<String>, Query, description = "Case-insensitive substring of the city"),
        ("min_wage" = Option<f64>, Query, description = "Minimum wage amount, inclusive"),
        ("employer" = Option<String>, Query, description = "Employer id")
    ),
    responses(
        (status = 200, description = "Matching jobs, newest first", body = Vec<Job>),
        (status = 400, description = "Malformed query")
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<JobFilter>,
) -> ApiResult<Json<Vec<Job>>> {
    let mut jobs = state.jobs.list(&filter).await?;
    populate(&state, &mut jobs, false).await?;
    Ok(Json(jobs))
}

/// Publish a job posting
#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "Jobs",
    security(("bearer_auth" = [])),
    request_body = NewJob,
    responses(
        (status = 201, description = "Job created", body = Job),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Employer or admin role required"),
        (status = 422, description = "Invalid fields")
    )
)]
pub async fn create_job(
    State(state): State<AppState>,
    EmployerUser(user): EmployerUser,
    AppJson(posting): AppJson<NewJob>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    posting
        .validate()
        .into_result()
        .map_err(|errors| DihadiError::validation(errors, "jobs"))?;

    let job = state
        .jobs
        .insert(Job::new(&user.id, posting, Utc::now()))
        .await?;
    info!(job_id = %job.id, employer_id = %user.id, "Job created");

    let mut jobs = [job];
    populate(&state, &mut jobs, false).await?;
    let [job] = jobs;
    Ok((StatusCode::CREATED, Json(job)))
}

/// Job detail with employer and applicant contacts
#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "Jobs",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job detail", body = Job),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let job = state
        .jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| DihadiError::not_found("Job not found", "jobs"))?;

    let mut jobs = [job];
    populate(&state, &mut jobs, true).await?;
    let [job] = jobs;
    Ok(Json(job))
}

/// Apply for a job
#[utoipa::path(
    post,
    path = "/api/jobs/{id}/apply",
    tag = "Jobs",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 201, description = "Application recorded", body = Applicant),
        (status = 400, description = "Already applied or job not open"),
        (status = 403, description = "Worker role required"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn apply_for_job(
    State(state): State<AppState>,
    WorkerUser(user): WorkerUser,
    Path(job_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Applicant>)> {
    let applicant = state
        .jobs
        .add_applicant(&job_id, &user.id, Utc::now())
        .await?;

    info!(job_id = %job_id, worker_id = %user.id, "Applied for job");
    Ok((StatusCode::CREATED, Json(applicant)))
}

/// Accept or reject an application
#[utoipa::path(
    put,
    path = "/api/jobs/{id}/applicants/{applicant_id}",
    tag = "Jobs",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Job id"),
        ("applicant_id" = String, Path, description = "Applicant id")
    ),
    request_body = ApplicationStatusUpdate,
    responses(
        (status = 200, description = "Updated job", body = Job),
        (status = 403, description = "Not the owning employer"),
        (status = 404, description = "Job or applicant not found")
    )
)]
pub async fn update_application_status(
    State(state): State<AppState>,
    EmployerUser(user): EmployerUser,
    Path((job_id, applicant_id)): Path<(String, String)>,
    AppJson(update): AppJson<ApplicationStatusUpdate>,
) -> ApiResult<Json<Job>> {
    load_owned_job(&state, &job_id, &user.id).await?;

    let job = state
        .jobs
        .set_applicant_status(&job_id, &applicant_id, update.status, Utc::now())
        .await?;
    info!(job_id = %job_id, applicant_id = %applicant_id, status = %update.status, "Application status updated");

    let mut jobs = [job];
    populate(&state, &mut jobs, true).await?;
    let [job] = jobs;
    Ok(Json(job))
}

/// Change the overall status of a posting
#[utoipa::path(
    put,
    path = "/api/jobs/{id}/status",
    tag = "Jobs",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Job id")),
    request_body = JobStatusUpdate,
    responses(
        (status = 200, description = "Updated job", body = Job),
        (status = 403, description = "Not the owning employer"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn update_job_status(
    State(state): State<AppState>,
    EmployerUser(user): EmployerUser,
    Path(job_id): Path<String>,
    AppJson(update): AppJson<JobStatusUpdate>,
) -> ApiResult<Json<Job>> {
    load_owned_job(&state, &job_id, &user.id).await?;

    let job = state
        .jobs
        .set_status(&job_id, update.status, Utc::now())
        .await?;
    info!(job_id = %job_id, status = %update.status, "Job status updated");

    let mut jobs = [job];
    populate(&state, &mut jobs, true).await?;
    let [job] = jobs;
    Ok(Json(job))
}

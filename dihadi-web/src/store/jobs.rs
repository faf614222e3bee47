//! Job postings and their applications

#[cfg(feature = "sqlite")]
use super::database::DatabaseJobStore;
use chrono::{DateTime, Utc};
use dihadi_core::{
    Applicant, ApplicantStatus, DihadiError, DihadiResult, Job, JobFilter, JobStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub(crate) const JOB_NOT_FOUND: &str = "Job not found";
pub(crate) const NOT_ACCEPTING: &str = "Job is not accepting applications";

#[derive(Debug, Clone)]
pub enum JobStore {
    Memory(Arc<RwLock<HashMap<String, Job>>>),
    #[cfg(feature = "sqlite")]
    Database(DatabaseJobStore),
}

impl Default for JobStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl JobStore {
    pub fn memory() -> Self {
        Self::Memory(Arc::new(RwLock::new(HashMap::new())))
    }

    pub async fn insert(&self, job: Job) -> DihadiResult<Job> {
        match self {
            Self::Memory(jobs) => {
                jobs.write().await.insert(job.id.clone(), job.clone());
                Ok(job)
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db) => db.insert(job).await,
        }
    }

    /// Postings matching `filter`, newest first
    pub async fn list(&self, filter: &JobFilter) -> DihadiResult<Vec<Job>> {
        match self {
            Self::Memory(jobs) => {
                let mut matching: Vec<Job> = jobs
                    .read()
                    .await
                    .values()
                    .filter(|job| filter.matches(job))
                    .cloned()
                    .collect();
                matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(matching)
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db) => db.list(filter).await,
        }
    }

    pub async fn get(&self, job_id: &str) -> DihadiResult<Option<Job>> {
        match self {
            Self::Memory(jobs) => Ok(jobs.read().await.get(job_id).cloned()),
            #[cfg(feature = "sqlite")]
            Self::Database(db) => db.get(job_id).await,
        }
    }

    /// Record a worker's application to an open posting
    pub async fn add_applicant(
        &self,
        job_id: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> DihadiResult<Applicant> {
        match self {
            Self::Memory(jobs) => {
                let mut jobs = jobs.write().await;
                let job = jobs
                    .get_mut(job_id)
                    .ok_or_else(|| DihadiError::not_found(JOB_NOT_FOUND, "jobs"))?;

                if job.status != JobStatus::Open {
                    return Err(DihadiError::conflict(NOT_ACCEPTING, "jobs"));
                }
                let applicant = job.add_applicant(worker_id, now)?;

                debug!(job_id, worker_id, "Application recorded");
                Ok(applicant)
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db) => db.add_applicant(job_id, worker_id, now).await,
        }
    }

    pub async fn set_applicant_status(
        &self,
        job_id: &str,
        applicant_id: &str,
        status: ApplicantStatus,
        now: DateTime<Utc>,
    ) -> DihadiResult<Job> {
        match self {
            Self::Memory(jobs) => {
                let mut jobs = jobs.write().await;
                let job = jobs
                    .get_mut(job_id)
                    .ok_or_else(|| DihadiError::not_found(JOB_NOT_FOUND, "jobs"))?;

                job.set_applicant_status(applicant_id, status, now)?;
                Ok(job.clone())
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db) => {
                db.set_applicant_status(job_id, applicant_id, status, now)
                    .await
            }
        }
    }

    pub async fn set_status(
        &self,
        job_id: &str,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> DihadiResult<Job> {
        match self {
            Self::Memory(jobs) => {
                let mut jobs = jobs.write().await;
                let job = jobs
                    .get_mut(job_id)
                    .ok_or_else(|| DihadiError::not_found(JOB_NOT_FOUND, "jobs"))?;

                job.status = status;
                job.updated_at = now;
                Ok(job.clone())
            }
            #[cfg(feature = "sqlite")]
            Self::Database(db) => db.set_status(job_id, status, now).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dihadi_core::{JobCategory, JobLocation, NewJob, Wage, WageUnit};

    fn posting(title: &str, city: &str) -> NewJob {
        NewJob {
            title: title.to_string(),
            description: "Site work".to_string(),
            category: JobCategory::Construction,
            location: JobLocation {
                city: city.to_string(),
                ..Default::default()
            },
            wage: Wage {
                amount: 650.0,
                unit: WageUnit::Daily,
            },
            duration: "1 week".to_string(),
            workers_needed: Some(3),
            requirements: Vec::new(),
            start_date: None,
            end_date: None,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = JobStore::memory();
        let now = Utc::now();

        store
            .insert(Job::new("emp", posting("older", "Pune"), now - Duration::hours(1)))
            .await
            .unwrap();
        store
            .insert(Job::new("emp", posting("newer", "Pune"), now))
            .await
            .unwrap();

        let jobs = store.list(&JobFilter::default()).await.unwrap();
        let titles: Vec<&str> = jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_apply_rules() {
        let store = JobStore::memory();
        let job = store
            .insert(Job::new("emp", posting("Mason", "Pune"), Utc::now()))
            .await
            .unwrap();

        store.add_applicant(&job.id, "w1", Utc::now()).await.unwrap();

        let again = store.add_applicant(&job.id, "w1", Utc::now()).await;
        assert!(matches!(again, Err(DihadiError::Conflict { .. })));

        let missing = store.add_applicant("nope", "w1", Utc::now()).await;
        assert!(matches!(missing, Err(DihadiError::NotFound { .. })));

        store
            .set_status(&job.id, JobStatus::Closed, Utc::now())
            .await
            .unwrap();
        let closed = store.add_applicant(&job.id, "w2", Utc::now()).await;
        assert!(matches!(closed, Err(DihadiError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_set_applicant_status() {
        let store = JobStore::memory();
        let job = store
            .insert(Job::new("emp", posting("Mason", "Pune"), Utc::now()))
            .await
            .unwrap();
        let applicant = store.add_applicant(&job.id, "w1", Utc::now()).await.unwrap();

        let updated = store
            .set_applicant_status(&job.id, &applicant.id, ApplicantStatus::Accepted, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.applicants[0].status, ApplicantStatus::Accepted);

        let missing = store
            .set_applicant_status(&job.id, "nope", ApplicantStatus::Rejected, Utc::now())
            .await;
        assert!(matches!(missing, Err(DihadiError::NotFound { .. })));
    }
}

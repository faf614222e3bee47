//! SQLite backends for jobs and wage benchmarks

use super::jobs::{JOB_NOT_FOUND, NOT_ACCEPTING};
use crate::database::{parse_timestamp, timestamp};
use chrono::{DateTime, NaiveDate, Utc};
use dihadi_core::{
    storage_error, Applicant, ApplicantStatus, DihadiError, DihadiResult, Job, JobFilter,
    JobLocation, JobStatus, Wage, WageBenchmark, WageFilter, WageLocation,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, error, info};

fn parse_time(value: &str, component: &str) -> DihadiResult<DateTime<Utc>> {
    parse_timestamp(value).map_err(|e| storage_error!("Invalid stored timestamp", component, e))
}

fn parse_date(value: Option<String>) -> DihadiResult<Option<NaiveDate>> {
    value
        .map(|d| {
            d.parse::<NaiveDate>()
                .map_err(|e| storage_error!("Invalid stored date", "jobs", e))
        })
        .transpose()
}

fn parse_enum<T>(value: &str, component: &str) -> DihadiResult<T>
where
    T: std::str::FromStr<Err = dihadi_core::UnknownVariant>,
{
    value
        .parse()
        .map_err(|e| storage_error!("Invalid stored value", component, e))
}

#[derive(Debug, sqlx::FromRow)]
struct JobRecord {
    id: String,
    title: String,
    description: String,
    category: String,
    employer_id: String,
    city: String,
    state: String,
    address: String,
    wage_amount: f64,
    wage_unit: String,
    duration: String,
    workers_needed: i64,
    requirements: String, // JSON array
    start_date: Option<String>,
    end_date: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl JobRecord {
    fn into_job(self, applicants: Vec<Applicant>) -> DihadiResult<Job> {
        Ok(Job {
            id: self.id,
            title: self.title,
            description: self.description,
            category: parse_enum(&self.category, "jobs")?,
            employer_id: self.employer_id,
            location: JobLocation {
                city: self.city,
                state: self.state,
                address: self.address,
            },
            wage: Wage {
                amount: self.wage_amount,
                unit: parse_enum(&self.wage_unit, "jobs")?,
            },
            duration: self.duration,
            workers_needed: u32::try_from(self.workers_needed).unwrap_or(1),
            requirements: serde_json::from_str(&self.requirements)?,
            start_date: parse_date(self.start_date)?,
            end_date: parse_date(self.end_date)?,
            status: parse_enum(&self.status, "jobs")?,
            applicants,
            created_at: parse_time(&self.created_at, "jobs")?,
            updated_at: parse_time(&self.updated_at, "jobs")?,
            employer: None,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ApplicantRecord {
    id: String,
    job_id: String,
    worker_id: String,
    status: String,
    applied_at: String,
}

impl ApplicantRecord {
    fn into_applicant(self) -> DihadiResult<Applicant> {
        Ok(Applicant {
            id: self.id,
            worker_id: self.worker_id,
            status: parse_enum(&self.status, "jobs")?,
            applied_at: parse_time(&self.applied_at, "jobs")?,
            worker: None,
        })
    }
}

const SELECT_JOBS: &str = "SELECT id, title, description, category, employer_id, city, state, \
     address, wage_amount, wage_unit, duration, workers_needed, requirements, start_date, \
     end_date, status, created_at, updated_at FROM jobs";

const SELECT_APPLICANTS: &str =
    "SELECT id, job_id, worker_id, status, applied_at FROM job_applicants";

/// Jobs with their applicant rows
#[derive(Debug, Clone)]
pub struct DatabaseJobStore {
    pool: SqlitePool,
}

impl DatabaseJobStore {
    pub async fn new(pool: SqlitePool) -> DihadiResult<Self> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> DihadiResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                employer_id TEXT NOT NULL,
                city TEXT NOT NULL DEFAULT '',
                state TEXT NOT NULL DEFAULT '',
                address TEXT NOT NULL DEFAULT '',
                wage_amount REAL NOT NULL,
                wage_unit TEXT NOT NULL,
                duration TEXT NOT NULL,
                workers_needed INTEGER NOT NULL DEFAULT 1,
                requirements TEXT NOT NULL DEFAULT '[]',
                start_date TEXT,
                end_date TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs(created_at)",
            r#"
            CREATE TABLE IF NOT EXISTS job_applicants (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
                worker_id TEXT NOT NULL,
                status TEXT NOT NULL,
                applied_at TEXT NOT NULL,
                UNIQUE(job_id, worker_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_job_applicants_job ON job_applicants(job_id)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to create job tables: {}", e);
                    storage_error!("Failed to create job tables", "jobs", e)
                })?;
        }

        info!("Job tables ready");
        Ok(())
    }

    pub async fn insert(&self, job: Job) -> DihadiResult<Job> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, title, description, category, employer_id, city, state,
                              address, wage_amount, wage_unit, duration, workers_needed,
                              requirements, start_date, end_date, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.category.as_str())
        .bind(&job.employer_id)
        .bind(&job.location.city)
        .bind(&job.location.state)
        .bind(&job.location.address)
        .bind(job.wage.amount)
        .bind(job.wage.unit.as_str())
        .bind(&job.duration)
        .bind(i64::from(job.workers_needed))
        .bind(serde_json::to_string(&job.requirements)?)
        .bind(job.start_date.map(|d| d.to_string()))
        .bind(job.end_date.map(|d| d.to_string()))
        .bind(job.status.as_str())
        .bind(timestamp(&job.created_at))
        .bind(timestamp(&job.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error!("Failed to insert job", "jobs", e))?;

        debug!("Stored job {}", job.id);
        Ok(job)
    }

    pub async fn list(&self, filter: &JobFilter) -> DihadiResult<Vec<Job>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_JOBS);
        query.push(" WHERE 1 = 1");
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(min_wage) = filter.min_wage {
            query.push(" AND wage_amount >= ").push_bind(min_wage);
        }
        if let Some(employer) = filter.employer.as_deref().map(str::trim) {
            if !employer.is_empty() {
                query.push(" AND employer_id = ").push_bind(employer.to_string());
            }
        }
        query.push(" ORDER BY created_at DESC");

        let records: Vec<JobRecord> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to list jobs", "jobs", e))?;

        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let mut applicants = self.applicants_for(&ids).await?;

        let mut jobs = Vec::with_capacity(records.len());
        for record in records {
            let job_applicants = applicants.remove(&record.id).unwrap_or_default();
            let job = record.into_job(job_applicants)?;
            // Location is a case-insensitive substring match, done here rather than in SQL
            if filter.matches(&job) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    pub async fn get(&self, job_id: &str) -> DihadiResult<Option<Job>> {
        let record: Option<JobRecord> = sqlx::query_as(&format!("{SELECT_JOBS} WHERE id = ?"))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to load job", "jobs", e))?;

        let Some(record) = record else {
            return Ok(None);
        };

        let applicants = self
            .applicants_for(&[record.id.clone()])
            .await?
            .remove(&record.id)
            .unwrap_or_default();
        record.into_job(applicants).map(Some)
    }

    async fn applicants_for(&self, job_ids: &[String]) -> DihadiResult<HashMap<String, Vec<Applicant>>> {
        let mut grouped: HashMap<String, Vec<Applicant>> = HashMap::new();
        if job_ids.is_empty() {
            return Ok(grouped);
        }

        let mut query = QueryBuilder::<Sqlite>::new(SELECT_APPLICANTS);
        query.push(" WHERE job_id IN (");
        let mut separated = query.separated(", ");
        for id in job_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY applied_at, rowid");

        let records: Vec<ApplicantRecord> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to load applicants", "jobs", e))?;

        for record in records {
            let job_id = record.job_id.clone();
            grouped
                .entry(job_id)
                .or_default()
                .push(record.into_applicant()?);
        }
        Ok(grouped)
    }

    pub async fn add_applicant(
        &self,
        job_id: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> DihadiResult<Applicant> {
        let job = self
            .get(job_id)
            .await?
            .ok_or_else(|| DihadiError::not_found(JOB_NOT_FOUND, "jobs"))?;
        if job.status != JobStatus::Open {
            return Err(DihadiError::conflict(NOT_ACCEPTING, "jobs"));
        }

        let applicant = Applicant::new(worker_id, now);
        let result = sqlx::query(
            "INSERT INTO job_applicants (id, job_id, worker_id, status, applied_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&applicant.id)
        .bind(job_id)
        .bind(worker_id)
        .bind(applicant.status.as_str())
        .bind(timestamp(&applicant.applied_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(DihadiError::conflict("Already applied for this job", "jobs"));
            }
            Err(e) => return Err(storage_error!("Failed to record application", "jobs", e)),
        }

        self.touch(job_id, now).await?;
        Ok(applicant)
    }

    pub async fn set_applicant_status(
        &self,
        job_id: &str,
        applicant_id: &str,
        status: ApplicantStatus,
        now: DateTime<Utc>,
    ) -> DihadiResult<Job> {
        let result = sqlx::query("UPDATE job_applicants SET status = ? WHERE id = ? AND job_id = ?")
            .bind(status.as_str())
            .bind(applicant_id)
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to update application", "jobs", e))?;

        if result.rows_affected() == 0 {
            return Err(DihadiError::not_found("Applicant not found", "jobs"));
        }

        self.touch(job_id, now).await?;
        self.get(job_id)
            .await?
            .ok_or_else(|| DihadiError::not_found(JOB_NOT_FOUND, "jobs"))
    }

    pub async fn set_status(
        &self,
        job_id: &str,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> DihadiResult<Job> {
        let result = sqlx::query("UPDATE jobs SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(timestamp(&now))
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to update job status", "jobs", e))?;

        if result.rows_affected() == 0 {
            return Err(DihadiError::not_found(JOB_NOT_FOUND, "jobs"));
        }

        self.get(job_id)
            .await?
            .ok_or_else(|| DihadiError::not_found(JOB_NOT_FOUND, "jobs"))
    }

    async fn touch(&self, job_id: &str, now: DateTime<Utc>) -> DihadiResult<()> {
        sqlx::query("UPDATE jobs SET updated_at = ? WHERE id = ?")
            .bind(timestamp(&now))
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to update job", "jobs", e))?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WageRecord {
    id: String,
    category: String,
    city: String,
    state: String,
    average_wage: f64,
    min_wage: Option<f64>,
    max_wage: Option<f64>,
    currency: String,
    last_updated: String,
}

impl WageRecord {
    fn into_benchmark(self) -> DihadiResult<WageBenchmark> {
        Ok(WageBenchmark {
            id: self.id,
            category: self.category,
            location: WageLocation {
                city: self.city,
                state: self.state,
            },
            average_wage: self.average_wage,
            min_wage: self.min_wage,
            max_wage: self.max_wage,
            currency: self.currency,
            last_updated: parse_time(&self.last_updated, "wages")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseWageStore {
    pool: SqlitePool,
}

impl DatabaseWageStore {
    pub async fn new(pool: SqlitePool) -> DihadiResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wages (
                id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                city TEXT NOT NULL DEFAULT '',
                state TEXT NOT NULL DEFAULT '',
                average_wage REAL NOT NULL,
                min_wage REAL,
                max_wage REAL,
                currency TEXT NOT NULL,
                last_updated TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| storage_error!("Failed to create wages table", "wages", e))?;

        info!("Wages table ready");
        Ok(Self { pool })
    }

    pub async fn insert(&self, wage: WageBenchmark) -> DihadiResult<WageBenchmark> {
        sqlx::query(
            r#"
            INSERT INTO wages (id, category, city, state, average_wage, min_wage, max_wage,
                               currency, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&wage.id)
        .bind(&wage.category)
        .bind(&wage.location.city)
        .bind(&wage.location.state)
        .bind(wage.average_wage)
        .bind(wage.min_wage)
        .bind(wage.max_wage)
        .bind(&wage.currency)
        .bind(timestamp(&wage.last_updated))
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error!("Failed to insert wage benchmark", "wages", e))?;

        Ok(wage)
    }

    pub async fn list(&self, filter: &WageFilter) -> DihadiResult<Vec<WageBenchmark>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, category, city, state, average_wage, min_wage, max_wage, currency, \
             last_updated FROM wages",
        );
        if let Some(category) = filter.category.as_deref().map(str::trim) {
            if !category.is_empty() {
                query.push(" WHERE category = ").push_bind(category.to_string());
            }
        }
        query.push(" ORDER BY last_updated DESC");

        let records: Vec<WageRecord> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to list wage benchmarks", "wages", e))?;

        let mut wages = Vec::with_capacity(records.len());
        for record in records {
            let wage = record.into_benchmark()?;
            if filter.matches(&wage) {
                wages.push(wage);
            }
        }
        Ok(wages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dihadi_core::{JobCategory, NewJob, NewWage, WageUnit};

    async fn pool() -> SqlitePool {
        crate::database::connect("sqlite::memory:").await.unwrap()
    }

    fn posting(city: &str, amount: f64) -> NewJob {
        NewJob {
            title: "Delivery rider".to_string(),
            description: "Evening shift".to_string(),
            category: JobCategory::Delivery,
            location: JobLocation {
                city: city.to_string(),
                state: "Telangana".to_string(),
                address: "Road 12".to_string(),
            },
            wage: Wage {
                amount,
                unit: WageUnit::Hourly,
            },
            duration: "1 month".to_string(),
            workers_needed: Some(2),
            requirements: vec!["two-wheeler licence".to_string()],
            start_date: NaiveDate::from_ymd_opt(2026, 11, 1),
            end_date: None,
        }
    }

    #[tokio::test]
    async fn test_job_round_trip_with_applicants() {
        let store = DatabaseJobStore::new(pool().await).await.unwrap();
        let job = store
            .insert(Job::new("emp", posting("Hyderabad", 120.0), Utc::now()))
            .await
            .unwrap();

        let applicant = store.add_applicant(&job.id, "w1", Utc::now()).await.unwrap();
        let loaded = store.get(&job.id).await.unwrap().unwrap();

        assert_eq!(loaded.title, "Delivery rider");
        assert_eq!(loaded.wage.unit, WageUnit::Hourly);
        assert_eq!(loaded.start_date, NaiveDate::from_ymd_opt(2026, 11, 1));
        assert_eq!(loaded.requirements, vec!["two-wheeler licence".to_string()]);
        assert_eq!(loaded.applicants.len(), 1);
        assert_eq!(loaded.applicants[0].id, applicant.id);
    }

    #[tokio::test]
    async fn test_duplicate_application_is_conflict() {
        let store = DatabaseJobStore::new(pool().await).await.unwrap();
        let job = store
            .insert(Job::new("emp", posting("Hyderabad", 120.0), Utc::now()))
            .await
            .unwrap();

        store.add_applicant(&job.id, "w1", Utc::now()).await.unwrap();
        let again = store.add_applicant(&job.id, "w1", Utc::now()).await;

        assert!(matches!(again, Err(DihadiError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let store = DatabaseJobStore::new(pool().await).await.unwrap();
        let now = Utc::now();
        store
            .insert(Job::new("emp", posting("Hyderabad", 120.0), now - Duration::minutes(5)))
            .await
            .unwrap();
        store
            .insert(Job::new("emp", posting("Secunderabad", 90.0), now))
            .await
            .unwrap();
        store
            .insert(Job::new("emp", posting("Warangal", 150.0), now))
            .await
            .unwrap();

        let filter = JobFilter {
            location: Some("ABAD".to_string()),
            ..Default::default()
        };
        let cities: Vec<String> = store
            .list(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.location.city)
            .collect();
        assert_eq!(cities, vec!["Secunderabad", "Hyderabad"]);

        let filter = JobFilter {
            min_wage: Some(100.0),
            ..Default::default()
        };
        assert_eq!(store.list(&filter).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_status_updates() {
        let store = DatabaseJobStore::new(pool().await).await.unwrap();
        let job = store
            .insert(Job::new("emp", posting("Hyderabad", 120.0), Utc::now()))
            .await
            .unwrap();
        let applicant = store.add_applicant(&job.id, "w1", Utc::now()).await.unwrap();

        let updated = store
            .set_applicant_status(&job.id, &applicant.id, ApplicantStatus::Rejected, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.applicants[0].status, ApplicantStatus::Rejected);

        let closed = store
            .set_status(&job.id, JobStatus::InProgress, Utc::now())
            .await
            .unwrap();
        assert_eq!(closed.status, JobStatus::InProgress);

        let late = store.add_applicant(&job.id, "w2", Utc::now()).await;
        assert!(matches!(late, Err(DihadiError::Conflict { .. })));

        let missing = store.set_status("nope", JobStatus::Closed, Utc::now()).await;
        assert!(matches!(missing, Err(DihadiError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_wage_store_filters() {
        let store = DatabaseWageStore::new(pool().await).await.unwrap();
        for (category, city) in [("construction", "Chennai"), ("domestic", "Chennai")] {
            let wage = WageBenchmark::new(
                NewWage {
                    category: category.to_string(),
                    location: WageLocation {
                        city: city.to_string(),
                        state: "Tamil Nadu".to_string(),
                    },
                    average_wage: 500.0,
                    min_wage: Some(400.0),
                    max_wage: None,
                    currency: None,
                },
                Utc::now(),
            );
            store.insert(wage).await.unwrap();
        }

        let filter = WageFilter {
            category: Some("domestic".to_string()),
            state: Some("tamil".to_string()),
            ..Default::default()
        };
        let wages = store.list(&filter).await.unwrap();
        assert_eq!(wages.len(), 1);
        assert_eq!(wages[0].min_wage, Some(400.0));
        assert_eq!(wages[0].currency, "INR");
    }
}

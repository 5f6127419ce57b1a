use std::convert::TryFrom;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{JobsRepo, NewJobRecord, RepoError},
    domain::{
        entities::JobRecord,
        types::{JobState, JobType},
    },
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    job_type: String,
    job: serde_json::Value,
    status: String,
    attempts: i32,
    max_attempts: i32,
    run_at: OffsetDateTime,
    last_error: Option<String>,
    done_at: Option<OffsetDateTime>,
}

impl TryFrom<JobRow> for JobRecord {
    type Error = RepoError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let job_type = JobType::try_from(row.job_type.as_str()).map_err(|_| {
            RepoError::from_persistence(format!("unknown job type `{}`", row.job_type))
        })?;

        let state = JobState::try_from(row.status.as_str()).map_err(|_| {
            RepoError::from_persistence(format!("unknown job state `{}`", row.status))
        })?;

        Ok(Self {
            id: row.id,
            job_type,
            payload: row.job,
            state,
            attempts: row.attempts,
            max_attempts: row.max_attempts,
            run_at: row.run_at,
            done_at: row.done_at,
            last_error: row.last_error,
        })
    }
}

#[async_trait]
impl JobsRepo for PostgresRepositories {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT (apalis.push_job($1, $2::json, $3, $4, $5, $6)).id
            "#,
        )
        .bind(job.job_type.as_str())
        .bind(&job.payload)
        .bind(JobState::Pending.as_str())
        .bind(job.run_at)
        .bind(job.max_attempts)
        .bind(job.priority)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_job(&self, id: &str) -> Result<Option<JobRecord>, RepoError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id,
                   job_type,
                   job,
                   status,
                   attempts,
                   max_attempts,
                   run_at,
                   last_error,
                   done_at
              FROM apalis.jobs
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(JobRecord::try_from).transpose()
    }
}

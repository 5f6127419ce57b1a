use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    application::repos::{JobsRepo, NewJobRecord, RepoError},
    domain::types::JobType,
};

/// A payload that knows which queue it belongs to and how it is retried.
pub trait QueuedJob: Serialize {
    const JOB_TYPE: JobType;
    const MAX_ATTEMPTS: i32;
    const PRIORITY: i32 = 0;
}

/// Push `payload` onto its queue to run as soon as a worker is free.
pub async fn enqueue<J, P>(repo: &J, payload: &P) -> Result<String, RepoError>
where
    J: JobsRepo + ?Sized,
    P: QueuedJob,
{
    let record = NewJobRecord {
        job_type: P::JOB_TYPE,
        payload: serde_json::to_value(payload).map_err(RepoError::from_persistence)?,
        run_at: OffsetDateTime::now_utc(),
        max_attempts: P::MAX_ATTEMPTS,
        priority: P::PRIORITY,
    };

    repo.enqueue_job(record).await
}

use std::path::PathBuf;

use apalis::prelude::{Data, Error as ApalisError};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    application::{
        export::{ExportError, checked_file_name, sheet::layout},
        repos::{JobsRepo, RepoError},
    },
    domain::types::JobType,
    infra::{spreadsheet::write_workbook, telemetry::names},
};

use super::{
    context::{ExportJobContext, job_failed},
    queue::{QueuedJob, enqueue},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMenusJobPayload {
    pub file_name: String,
}

impl QueuedJob for ExportMenusJobPayload {
    const JOB_TYPE: JobType = JobType::ExportMenus;
    const MAX_ATTEMPTS: i32 = 3;
}

pub async fn enqueue_export_menus_job<J: JobsRepo + ?Sized>(
    repo: &J,
    file_name: String,
) -> Result<String, RepoError> {
    enqueue(repo, &ExportMenusJobPayload { file_name }).await
}

pub async fn process_export_menus_job(
    payload: ExportMenusJobPayload,
    context: Data<ExportJobContext>,
) -> Result<(), ApalisError> {
    let ctx = &*context;

    match run_export(ctx, &payload.file_name).await {
        Ok(path) => {
            counter!(names::EXPORT_JOBS, "outcome" => "done").increment(1);
            info!(
                target = "application::jobs::process_export_menus_job",
                path = %path.display(),
                "catalog exported"
            );
            Ok(())
        }
        Err(err) => {
            counter!(names::EXPORT_JOBS, "outcome" => "failed").increment(1);
            error!(
                target = "application::jobs::process_export_menus_job",
                file_name = %payload.file_name,
                error = %err,
                "catalog export failed"
            );
            Err(job_failed(err))
        }
    }
}

/// Snapshot the catalog and write it to `file_name` inside the export directory.
pub async fn run_export(ctx: &ExportJobContext, file_name: &str) -> Result<PathBuf, ExportError> {
    let file_name = checked_file_name(file_name.to_string())?;
    tokio::fs::create_dir_all(&ctx.directory).await?;

    let tree = ctx.catalog.load_tree().await?;
    let cells = layout(&tree);
    let path = ctx.directory.join(file_name);

    let target = path.clone();
    tokio::task::spawn_blocking(move || write_workbook(&target, &cells))
        .await
        .map_err(|err| ExportError::Worker(err.to_string()))??;

    Ok(path)
}

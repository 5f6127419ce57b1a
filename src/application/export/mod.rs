//! Spreadsheet exports of the whole catalog, produced by a background job.
//!
//! `submit` enqueues work and returns the job id immediately; `poll` reports
//! progress until the workbook is ready for download.

pub mod sheet;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};
use tracing::info;
use uuid::Uuid;

use crate::application::jobs::{ExportMenusJobPayload, enqueue_export_menus_job};
use crate::application::repos::{JobsRepo, RepoError};
use crate::domain::types::JobState;
use crate::infra::spreadsheet::SpreadsheetError;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export task not found")]
    NotFound,
    #[error("export task payload is invalid: {0}")]
    Payload(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
    #[error("export io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export worker panicked: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportStatus {
    Pending { state: JobState },
    Ready { file_name: String, path: PathBuf },
    Failed { message: String },
}

#[derive(Clone)]
pub struct ExportService {
    jobs: Arc<dyn JobsRepo>,
    directory: PathBuf,
}

impl ExportService {
    pub fn new(jobs: Arc<dyn JobsRepo>, directory: PathBuf) -> Self {
        Self { jobs, directory }
    }

    /// Queue an export and return its task id.
    pub async fn submit(&self) -> Result<String, ExportError> {
        let file_name = export_file_name(OffsetDateTime::now_utc(), Uuid::new_v4());
        let task_id = enqueue_export_menus_job(self.jobs.as_ref(), file_name.clone()).await?;
        info!(
            target = "carte::export",
            task_id = %task_id,
            file_name = %file_name,
            "export queued"
        );
        Ok(task_id)
    }

    pub async fn poll(&self, task_id: &str) -> Result<ExportStatus, ExportError> {
        let job = self
            .jobs
            .find_job(task_id)
            .await?
            .ok_or(ExportError::NotFound)?;

        match job.state {
            JobState::Done => {
                let payload: ExportMenusJobPayload = serde_json::from_value(job.payload)
                    .map_err(|err| ExportError::Payload(err.to_string()))?;
                let file_name = checked_file_name(payload.file_name)?;
                let path = self.directory.join(&file_name);
                Ok(ExportStatus::Ready { file_name, path })
            }
            JobState::Failed | JobState::Killed => Ok(ExportStatus::Failed {
                message: job
                    .last_error
                    .unwrap_or_else(|| "export failed without error text".to_string()),
            }),
            state => Ok(ExportStatus::Pending { state }),
        }
    }
}

/// `<dd-mm-YYYY-HH-MM>_<uuid>_menu.xlsx`
pub fn export_file_name(now: OffsetDateTime, id: Uuid) -> String {
    let stamp_format = format_description!("[day]-[month]-[year]-[hour]-[minute]");
    let stamp = now
        .format(stamp_format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("{stamp}_{}_menu.xlsx", id.simple())
}

/// Rejects names that would resolve outside the export directory.
pub fn checked_file_name(file_name: String) -> Result<String, ExportError> {
    let is_plain = Path::new(&file_name)
        .file_name()
        .is_some_and(|name| name == OsStr::new(&file_name));
    if file_name.is_empty() || !is_plain || file_name.starts_with('.') {
        return Err(ExportError::Payload(format!(
            "`{file_name}` is not a plain file name"
        )));
    }
    Ok(file_name)
}

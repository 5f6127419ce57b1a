//! Export task handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::export::{ExportError, ExportStatus};

use super::export_to_api;
use crate::infra::http::api::error::{ApiError, ErrorCode};
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn submit_export(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let task_id = state.exports.submit().await.map_err(export_to_api)?;
    Ok((StatusCode::ACCEPTED, Json(ExportAcceptedResponse { task_id })))
}

pub async fn poll_export(
    State(state): State<ApiState>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let status = state.exports.poll(&task_id).await.map_err(export_to_api)?;

    match status {
        ExportStatus::Pending { state } => Ok((
            StatusCode::ACCEPTED,
            Json(ExportPendingResponse {
                task_id,
                status: state,
            }),
        )
            .into_response()),
        ExportStatus::Failed { message } => {
            Err(ApiError::new(ErrorCode::ExportFailed, "Export task failed").with_hint(message))
        }
        ExportStatus::Ready { file_name, path } => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|err| export_to_api(ExportError::Io(err)))?;
            let disposition = HeaderValue::from_str(&format!(
                "attachment; filename=\"{file_name}\""
            ))
            .map_err(|err| export_to_api(ExportError::Payload(err.to_string())))?;

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
    }
}

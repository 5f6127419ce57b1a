use std::error::Error as StdError;

use crate::application::error::{ErrorReport, error_chain};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Machine-readable error codes returned in `{"error": {"code": ...}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Duplicate,
    InvalidInput,
    Integrity,
    DbTimeout,
    Repo,
    CacheUnavailable,
    Export,
    ExportFailed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::Duplicate => "duplicate",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::Integrity => "integrity_error",
            ErrorCode::DbTimeout => "db_timeout",
            ErrorCode::Repo => "repo_error",
            ErrorCode::CacheUnavailable => "cache_unavailable",
            ErrorCode::Export => "export_error",
            ErrorCode::ExportFailed => "export_failed",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Duplicate | ErrorCode::Integrity => StatusCode::CONFLICT,
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::DbTimeout | ErrorCode::CacheUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Repo | ErrorCode::Export | ErrorCode::ExportFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: &'static str,
    hint: Option<String>,
    causes: Vec<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: &'static str) -> Self {
        Self {
            code,
            message,
            hint: None,
            causes: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Record the error chain behind this response for the logs only.
    pub fn caused_by(mut self, error: &dyn StdError) -> Self {
        self.causes = error_chain(error);
        self
    }

    pub fn invalid_input(hint: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, "Invalid input").with_hint(hint)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = format!(
            "{}: {}",
            self.code.as_str(),
            self.hint.as_deref().unwrap_or(self.message)
        );
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.as_str(),
                message: self.message,
                hint: self.hint,
            },
        };

        let mut response = (status, Json(body)).into_response();
        ErrorReport::from_message("infra::http::api", status, detail)
            .with_causes(self.causes)
            .attach(&mut response);
        response
    }
}

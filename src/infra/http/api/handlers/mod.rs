//! API handlers organized by resource type.
//!
//! Error conversions shared by every resource live here.

mod dishes;
mod exports;
mod menus;
mod seed;
mod submenus;

pub use dishes::*;
pub use exports::*;
pub use menus::*;
pub use seed::*;
pub use submenus::*;

use axum::Json;
use axum::extract::rejection::JsonRejection;

use crate::application::catalog::{CatalogError, EntityKind};
use crate::application::export::ExportError;
use crate::application::repos::RepoError;

use super::error::{ApiError, ErrorCode};

/// Unwrap a JSON body, reporting malformed payloads in the API error format.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        ApiError::new(ErrorCode::InvalidInput, "Invalid request body")
            .with_hint(rejection.body_text())
    })
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => {
            ApiError::new(ErrorCode::Duplicate, "Duplicate record").with_hint(constraint)
        }
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::invalid_input(message),
        RepoError::Integrity { message } => {
            ApiError::new(ErrorCode::Integrity, "Integrity constraint violated").with_hint(message)
        }
        RepoError::Timeout => ApiError::new(ErrorCode::DbTimeout, "Database timeout"),
        RepoError::Persistence(message) => {
            ApiError::new(ErrorCode::Repo, "Persistence error").with_hint(message)
        }
    }
}

pub(crate) fn catalog_to_api(err: CatalogError) -> ApiError {
    match err {
        CatalogError::NotFound { entity } => ApiError::not_found(match entity {
            EntityKind::Menu => "menu not found",
            EntityKind::Submenu => "submenu not found",
            EntityKind::Dish => "dish not found",
        }),
        CatalogError::Conflict { entity } => ApiError::new(
            ErrorCode::Duplicate,
            match entity {
                EntityKind::Menu => "Menu title already exists",
                EntityKind::Submenu => "Submenu title already exists",
                EntityKind::Dish => "Dish title already exists",
            },
        ),
        CatalogError::Validation { field, reason } => {
            ApiError::invalid_input(format!("{field}: {reason}"))
        }
        CatalogError::Cache(cache) => {
            ApiError::new(ErrorCode::CacheUnavailable, "Cache unavailable").caused_by(&cache)
        }
        CatalogError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn export_to_api(err: ExportError) -> ApiError {
    match err {
        ExportError::NotFound => ApiError::not_found("export task not found"),
        ExportError::Repo(repo) => repo_to_api(repo),
        other => ApiError::new(ErrorCode::Export, "Export failed")
            .with_hint(other.to_string())
            .caused_by(&other),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::cache::CacheError;

    #[test]
    fn catalog_errors_map_to_statuses() {
        let not_found = catalog_to_api(CatalogError::not_found(EntityKind::Submenu));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict = catalog_to_api(CatalogError::Conflict {
            entity: EntityKind::Dish,
        });
        assert_eq!(conflict.code(), ErrorCode::Duplicate);

        let cache = catalog_to_api(CatalogError::Cache(CacheError::backend("down")));
        assert_eq!(cache.status(), StatusCode::SERVICE_UNAVAILABLE);

        let timeout = catalog_to_api(CatalogError::Repo(RepoError::Timeout));
        assert_eq!(timeout.code(), ErrorCode::DbTimeout);
    }
}

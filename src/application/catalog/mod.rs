//! Catalog services: cached reads and invalidating writes for menus, submenus and dishes.

mod dishes;
mod menus;
mod submenus;

pub use dishes::{CreateDishCommand, DishService, UpdateDishCommand};
pub use menus::{CreateMenuCommand, MenuService, UpdateMenuCommand};
pub use submenus::{CreateSubmenuCommand, SubmenuService, UpdateSubmenuCommand};

use std::fmt;

use thiserror::Error;

use crate::application::repos::RepoError;
use crate::cache::CacheError;

pub const TITLE_MAX_CHARS: usize = 128;
pub const DESCRIPTION_MAX_CHARS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Menu,
    Submenu,
    Dish,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Menu => "menu",
            EntityKind::Submenu => "submenu",
            EntityKind::Dish => "dish",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} not found")]
    NotFound { entity: EntityKind },
    #[error("{entity} title already exists")]
    Conflict { entity: EntityKind },
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("cache unavailable: {0}")]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Repo(RepoError),
}

impl CatalogError {
    pub fn not_found(entity: EntityKind) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Translate a store error, attributing `NotFound` to `missing`.
    pub fn from_repo(missing: EntityKind, err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound { entity: missing },
            RepoError::Duplicate { .. } => Self::Conflict { entity: missing },
            other => Self::Repo(other),
        }
    }

    /// Like [`CatalogError::from_repo`] for creates, where a missing row is the
    /// parent but a duplicate is the new child.
    fn from_create(created: EntityKind, parent: EntityKind, err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound { entity: parent },
            RepoError::Duplicate { .. } => Self::Conflict { entity: created },
            other => Self::Repo(other),
        }
    }
}

fn normalize_title(title: &str) -> Result<String, CatalogError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::validation("title", "must not be empty"));
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(CatalogError::validation(
            "title",
            format!("must be at most {TITLE_MAX_CHARS} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn check_description(description: Option<String>) -> Result<Option<String>, CatalogError> {
    match description {
        Some(value) if value.chars().count() > DESCRIPTION_MAX_CHARS => {
            Err(CatalogError::validation(
                "description",
                format!("must be at most {DESCRIPTION_MAX_CHARS} characters"),
            ))
        }
        other => Ok(other),
    }
}

/// Blank patch fields keep the stored value.
fn patch_title(title: Option<String>) -> Result<Option<String>, CatalogError> {
    match title {
        Some(value) if !value.trim().is_empty() => normalize_title(&value).map(Some),
        _ => Ok(None),
    }
}

fn patch_description(description: Option<String>) -> Result<Option<String>, CatalogError> {
    check_description(description.filter(|value| !value.is_empty()))
}

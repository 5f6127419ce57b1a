//! Repository traits describing persistence adapters.
//!
//! Lookups that address a child through its parents return `Ok(None)` when the
//! ancestry does not match, exactly as for an unknown id. Writes report a
//! missing target or ancestor as [`RepoError::NotFound`].

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{
    DishRecord, JobRecord, MenuRecord, MenuTree, SubmenuRecord,
};
use crate::domain::price::Price;
use crate::domain::types::JobType;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateMenuParams {
    pub title: String,
    pub description: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateMenuParams {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateSubmenuParams {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSubmenuParams {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateDishParams {
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDishParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
}

#[async_trait]
pub trait MenusRepo: Send + Sync {
    async fn list_menus(&self) -> Result<Vec<MenuRecord>, RepoError>;

    async fn find_menu(&self, menu_id: i64) -> Result<Option<MenuRecord>, RepoError>;
}

#[async_trait]
pub trait MenusWriteRepo: Send + Sync {
    async fn create_menu(&self, params: CreateMenuParams) -> Result<MenuRecord, RepoError>;

    async fn update_menu(
        &self,
        menu_id: i64,
        params: UpdateMenuParams,
    ) -> Result<MenuRecord, RepoError>;

    /// Removes the menu with all of its submenus and dishes.
    async fn delete_menu(&self, menu_id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SubmenusRepo: Send + Sync {
    /// Fails with `NotFound` when the menu does not exist.
    async fn list_submenus(&self, menu_id: i64) -> Result<Vec<SubmenuRecord>, RepoError>;

    async fn find_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Option<SubmenuRecord>, RepoError>;
}

#[async_trait]
pub trait SubmenusWriteRepo: Send + Sync {
    async fn create_submenu(
        &self,
        menu_id: i64,
        params: CreateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError>;

    async fn update_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
        params: UpdateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError>;

    async fn delete_submenu(&self, menu_id: i64, submenu_id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait DishesRepo: Send + Sync {
    /// Fails with `NotFound` when the submenu does not exist under the menu.
    async fn list_dishes(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Vec<DishRecord>, RepoError>;

    async fn find_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<Option<DishRecord>, RepoError>;
}

#[async_trait]
pub trait DishesWriteRepo: Send + Sync {
    async fn create_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        params: CreateDishParams,
    ) -> Result<DishRecord, RepoError>;

    async fn update_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
        params: UpdateDishParams,
    ) -> Result<DishRecord, RepoError>;

    async fn delete_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CatalogTreeRepo: Send + Sync {
    /// Every menu with nested submenus and dishes, ordered by id at each level.
    async fn load_tree(&self) -> Result<Vec<MenuTree>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub run_at: OffsetDateTime,
    pub max_attempts: i32,
    pub priority: i32,
}

#[async_trait]
pub trait JobsRepo: Send + Sync {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError>;

    async fn find_job(&self, id: &str) -> Result<Option<JobRecord>, RepoError>;
}

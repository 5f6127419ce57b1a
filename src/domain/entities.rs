//! Catalog entities mirrored from persistent storage.
//!
//! Count fields are derived at query time and never stored.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::price::Price;
use crate::domain::types::{JobState, JobType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub submenus_count: i64,
    pub dishes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub dishes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
}

/// A menu with its full nested content, as loaded for exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuTree {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub submenus: Vec<SubmenuTree>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmenuTree {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub dishes: Vec<DishRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: String,
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub state: JobState,
    pub attempts: i32,
    pub max_attempts: i32,
    pub run_at: OffsetDateTime,
    pub done_at: Option<OffsetDateTime>,
    pub last_error: Option<String>,
}

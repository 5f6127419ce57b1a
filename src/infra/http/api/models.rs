use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::price::Price;
use crate::domain::types::JobState;

#[derive(Debug, Deserialize, Serialize)]
pub struct MenuCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MenuUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SubmenuCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SubmenuUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DishCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DishUpdateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none_price")]
    pub price: Option<Price>,
}

/// An empty string keeps the stored price, like any other blank patch field.
fn blank_as_none_price<'de, D>(deserializer: D) -> Result<Option<Price>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => Price::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn deleted(message: &str) -> Self {
        Self {
            status: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportAcceptedResponse {
    pub task_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportPendingResponse {
    pub task_id: String,
    pub status: JobState,
}

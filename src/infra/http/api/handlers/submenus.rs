//! Submenus handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::catalog::{CreateSubmenuCommand, UpdateSubmenuCommand};

use super::{catalog_to_api, json_body};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_submenus(
    State(state): State<ApiState>,
    Path(menu_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let submenus = state
        .submenus
        .list(menu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(submenus))
}

pub async fn get_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let submenu = state
        .submenus
        .get(menu_id, submenu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(submenu))
}

pub async fn create_submenu(
    State(state): State<ApiState>,
    Path(menu_id): Path<i64>,
    payload: Result<Json<SubmenuCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = CreateSubmenuCommand {
        title: payload.title,
        description: payload.description,
    };

    let submenu = state
        .submenus
        .create(menu_id, command)
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(submenu)))
}

pub async fn update_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
    payload: Result<Json<SubmenuUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = UpdateSubmenuCommand {
        title: payload.title,
        description: payload.description,
    };

    let submenu = state
        .submenus
        .update(menu_id, submenu_id, command)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(submenu))
}

pub async fn delete_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .submenus
        .delete(menu_id, submenu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(DeleteResponse::deleted("The submenu has been deleted")))
}

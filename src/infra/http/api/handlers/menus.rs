//! Menus handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::catalog::{CreateMenuCommand, UpdateMenuCommand};

use super::{catalog_to_api, json_body};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_menus(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let menus = state.menus.list().await.map_err(catalog_to_api)?;
    Ok(Json(menus))
}

pub async fn get_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let menu = state.menus.get(menu_id).await.map_err(catalog_to_api)?;
    Ok(Json(menu))
}

pub async fn create_menu(
    State(state): State<ApiState>,
    payload: Result<Json<MenuCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = CreateMenuCommand {
        title: payload.title,
        description: payload.description,
    };

    let menu = state.menus.create(command).await.map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(menu)))
}

pub async fn update_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<i64>,
    payload: Result<Json<MenuUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = UpdateMenuCommand {
        title: payload.title,
        description: payload.description,
    };

    let menu = state
        .menus
        .update(menu_id, command)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(menu))
}

pub async fn delete_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.menus.delete(menu_id).await.map_err(catalog_to_api)?;
    Ok(Json(DeleteResponse::deleted("The menu has been deleted")))
}

//! Dishes handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::catalog::{CreateDishCommand, UpdateDishCommand};

use super::{catalog_to_api, json_body};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_dishes(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let dishes = state
        .dishes
        .list(menu_id, submenu_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dishes))
}

pub async fn get_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let dish = state
        .dishes
        .get(menu_id, submenu_id, dish_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dish))
}

pub async fn create_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(i64, i64)>,
    payload: Result<Json<DishCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = CreateDishCommand {
        title: payload.title,
        description: payload.description,
        price: payload.price,
    };

    let dish = state
        .dishes
        .create(menu_id, submenu_id, command)
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(dish)))
}

pub async fn update_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(i64, i64, i64)>,
    payload: Result<Json<DishUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let command = UpdateDishCommand {
        title: payload.title,
        description: payload.description,
        price: payload.price,
    };

    let dish = state
        .dishes
        .update(menu_id, submenu_id, dish_id, command)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dish))
}

pub async fn delete_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .dishes
        .delete(menu_id, submenu_id, dish_id)
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(DeleteResponse::deleted("The dish has been deleted")))
}

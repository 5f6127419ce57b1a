use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::seed::seed_demo_catalog;

use super::catalog_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn generate_data(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let summary = seed_demo_catalog(&state.menus, &state.submenus, &state.dishes)
        .await
        .map_err(catalog_to_api)?;
    Ok((StatusCode::CREATED, Json(summary)))
}

//! Restaurant API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::{Restaurant, RestaurantCreate};
use crate::db::repository::RestaurantRepository;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};

/// GET /api/restaurants - 获取所有餐厅
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Restaurant>>> {
    let repo = RestaurantRepository::new(state.db.clone());
    let restaurants = repo.find_all().await?;
    Ok(Json(restaurants))
}

/// GET /api/restaurants/:id - 获取单个餐厅
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Restaurant>> {
    let repo = RestaurantRepository::new(state.db.clone());
    let restaurant = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Restaurant {} not found", id)))?;
    Ok(Json(restaurant))
}

/// POST /api/restaurants - 创建餐厅
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<RestaurantCreate>,
) -> AppResult<Json<Restaurant>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    let repo = RestaurantRepository::new(state.db.clone());
    let restaurant = repo.create(payload).await?;
    Ok(Json(restaurant))
}

/// DELETE /api/restaurants/:id - 删除餐厅 (级联)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = RestaurantRepository::new(state.db.clone());
    repo.find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Restaurant {} not found", id)))?;
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}

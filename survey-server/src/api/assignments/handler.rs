//! Assignment API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::Assignment;
use crate::services::BulkAssignOutcome;
use crate::utils::{AppError, AppResult};

/// 默认权重：单问卷稳态下的 100%
const DEFAULT_WEIGHT: i64 = 100;

fn default_weight() -> i64 {
    DEFAULT_WEIGHT
}

#[derive(Debug, Deserialize)]
pub struct AssignSinglePayload {
    pub scan_code: String,
    pub questionnaire: String,
    #[serde(default = "default_weight")]
    pub weight: i64,
}

#[derive(Debug, Deserialize)]
pub struct AssignRestaurantPayload {
    pub restaurant: String,
    pub questionnaire: String,
    #[serde(default = "default_weight")]
    pub weight: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRestaurantQuery {
    pub restaurant: String,
    pub questionnaire: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub scan_code: Option<String>,
    pub restaurant: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemovedCount {
    pub removed_count: u64,
}

/// GET /api/assignments?scan_code=... | ?restaurant=... - 分配列表 (含停用，审计用)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Assignment>>> {
    let assignments = match (&query.scan_code, &query.restaurant) {
        (Some(scan_code), _) => state.assignments.list_for_scan_code(scan_code).await?,
        (None, Some(restaurant)) => state.assignments.list_for_restaurant(restaurant).await?,
        (None, None) => {
            return Err(AppError::validation(
                "either scan_code or restaurant query parameter is required",
            ));
        }
    };
    Ok(Json(assignments))
}

/// POST /api/assignments - 手动单桌绑定
pub async fn assign_single(
    State(state): State<ServerState>,
    Json(payload): Json<AssignSinglePayload>,
) -> AppResult<Json<Assignment>> {
    let assignment = state
        .assignments
        .assign_single(&payload.scan_code, &payload.questionnaire, payload.weight)
        .await?;
    Ok(Json(assignment))
}

/// POST /api/assignments/restaurant - 餐厅级批量分配
pub async fn assign_to_restaurant(
    State(state): State<ServerState>,
    Json(payload): Json<AssignRestaurantPayload>,
) -> AppResult<Json<BulkAssignOutcome>> {
    let outcome = state
        .assignments
        .assign_to_restaurant(&payload.restaurant, &payload.questionnaire, payload.weight)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/assignments/:id/deactivate - 软停用
pub async fn deactivate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    state.assignments.deactivate(&id).await?;
    Ok(Json(true))
}

/// DELETE /api/assignments/:id - 硬删除
pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    state.assignments.remove(&id).await?;
    Ok(Json(true))
}

/// DELETE /api/assignments/restaurant?restaurant=...&questionnaire=...
///
/// 硬删除一家餐厅针对某问卷的所有分配。
pub async fn remove_all_for_restaurant(
    State(state): State<ServerState>,
    Query(query): Query<RemoveRestaurantQuery>,
) -> AppResult<Json<RemovedCount>> {
    let removed_count = state
        .assignments
        .remove_all_for_restaurant(&query.questionnaire, &query.restaurant)
        .await?;
    Ok(Json(RemovedCount { removed_count }))
}

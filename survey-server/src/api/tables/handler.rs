//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{DiningTable, DiningTableCreate, ScanCode};
use crate::db::repository::{DiningTableRepository, ScanCodeRepository};
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub restaurant: String,
}

/// 桌台及其当前扫码
#[derive(Debug, Serialize)]
pub struct TableWithScanCode {
    pub table: DiningTable,
    pub scan_code: Option<ScanCode>,
}

/// GET /api/tables?restaurant=... - 获取餐厅的所有桌台
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DiningTable>>> {
    let repo = DiningTableRepository::new(state.db.clone());
    let tables = repo.find_by_restaurant(&query.restaurant).await?;
    Ok(Json(tables))
}

/// GET /api/tables/:id - 获取单个桌台及其扫码
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<TableWithScanCode>> {
    let repo = DiningTableRepository::new(state.db.clone());
    let table = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {} not found", id)))?;

    let scan_codes = ScanCodeRepository::new(state.db.clone());
    let scan_code = match &table.id {
        Some(table_ref) => scan_codes.find_by_table(table_ref).await?,
        None => None,
    };

    Ok(Json(TableWithScanCode { table, scan_code }))
}

/// POST /api/tables - 创建桌台
///
/// 桌台和扫码一并创建；新扫码立即继承餐厅现有的变体组合。
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<TableWithScanCode>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;

    let restaurant = payload.restaurant.clone();
    let repo = DiningTableRepository::new(state.db.clone());
    let table = repo.create(payload).await?;

    let table_ref = table
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Table record without id"))?;

    let scan_codes = ScanCodeRepository::new(state.db.clone());
    let scan_code = scan_codes.create(table_ref, restaurant.clone()).await?;

    // 自动传播：复制餐厅现有的 (问卷, 权重) 组合
    let scan_code_id = scan_code
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Scan code record without id"))?
        .to_string();
    state
        .assignments
        .provision_propagation(&scan_code_id, &restaurant.to_string())
        .await?;

    Ok(Json(TableWithScanCode {
        table,
        scan_code: Some(scan_code),
    }))
}

/// POST /api/tables/:id/scan-code/regenerate - 重新生成扫码
///
/// 建模为删旧建新：旧分配级联删除，新码重新传播。
pub async fn regenerate_scan_code(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ScanCode>> {
    let repo = DiningTableRepository::new(state.db.clone());
    let table = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {} not found", id)))?;
    let table_ref = table
        .id
        .ok_or_else(|| AppError::internal("Table record without id"))?;

    let scan_codes = ScanCodeRepository::new(state.db.clone());
    if let Some(old) = scan_codes.find_by_table(&table_ref).await?
        && let Some(old_ref) = old.id
    {
        scan_codes.delete(&old_ref.to_string()).await?;
    }

    let scan_code = scan_codes
        .create(table_ref, table.restaurant.clone())
        .await?;

    let scan_code_id = scan_code
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Scan code record without id"))?
        .to_string();
    state
        .assignments
        .provision_propagation(&scan_code_id, &table.restaurant.to_string())
        .await?;

    Ok(Json(scan_code))
}

/// DELETE /api/tables/:id - 删除桌台 (级联扫码、分配、回答)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = DiningTableRepository::new(state.db.clone());
    repo.find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {} not found", id)))?;
    let result = repo.delete(&id).await?;
    Ok(Json(result))
}

//! Dining Table API 模块
//!
//! 桌台与扫码由员工操作一并创建；扫码"重新生成"是删旧建新，
//! 新码随之获得餐厅现有变体组合的传播。

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id).delete(handler::delete))
        .route("/{id}/scan-code/regenerate", post(handler::regenerate_scan_code))
}

//! Scan API 模块
//!
//! 顾客侧端点：扫码解析出一个变体，提交回答。

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/scan", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{code}", get(handler::resolve))
        .route("/{code}/responses", post(handler::submit))
}

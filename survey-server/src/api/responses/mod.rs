//! Response API 模块 (只读)
//!
//! 回答不可变：只提供列表和按变体计数，供下游分析导出。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/responses", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/counts", get(handler::counts))
}

//! 健康检查路由

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::time::SystemTime;

use crate::core::ServerState;

/// 健康检查路由 - 公共路由
pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    database: &'static str,
}

// 服务器启动时间 (懒加载静态变量)
static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

fn get_uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(SystemTime::now);
    SystemTime::now()
        .duration_since(*start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// 基础健康检查 (含数据库连通性)
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let database = match state.get_db().health().await {
        Ok(_) => "ok",
        Err(_) => "error",
    };

    Json(HealthResponse {
        status: if database == "ok" { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: get_uptime_seconds(),
        database,
    })
}

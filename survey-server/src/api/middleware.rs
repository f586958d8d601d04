//! 请求日志中间件
//!
//! 记录所有进入的 HTTP 请求，包含请求 ID、路径、状态码和延迟

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

/// 请求日志中间件
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    // 从请求头获取 Request ID，如果不存在则生成一个
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let response = next.run(req).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status.as_u16(),
            latency_ms,
            "Request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status.as_u16(),
            latency_ms,
            "Request completed"
        );
    }

    response
}

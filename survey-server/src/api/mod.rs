//! HTTP API 模块
//!
//! 薄路由层：认证、界面渲染、二维码图片生成都是外部协作者，
//! 这里只暴露引擎操作和扫码端点。

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod assignments;
pub mod health;
pub mod middleware;
pub mod questionnaires;
pub mod responses;
pub mod restaurants;
pub mod scan;
pub mod tables;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Admin API - 餐厅/桌台/问卷/分配管理
        .merge(restaurants::router())
        .merge(tables::router())
        .merge(questionnaires::router())
        .merge(assignments::router())
        .merge(responses::router())
        // Customer API - 扫码解析与提交
        .merge(scan::router())
        // Health API - public route
        .merge(health::router())
}

/// Build a fully configured application with all middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        // ========== Tower HTTP Middleware ==========
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // Request logging - outermost, executed first
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .with_state(state)
}

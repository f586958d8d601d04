//! Assignment API 模块
//!
//! 引擎的管理入口：单桌绑定、餐厅级批量分配、软停用与硬删除。

mod handler;

use axum::{Router, routing::delete, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/assignments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::assign_single))
        .route(
            "/restaurant",
            post(handler::assign_to_restaurant).delete(handler::remove_all_for_restaurant),
        )
        .route("/{id}/deactivate", post(handler::deactivate))
        .route("/{id}", delete(handler::remove))
}

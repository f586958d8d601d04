//! Response API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::Response;
use crate::db::repository::response::AssignmentCount;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub questionnaire: String,
}

/// GET /api/responses?questionnaire=... - 问卷的全部回答
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Response>>> {
    let responses = state
        .recorder
        .list_for_questionnaire(&query.questionnaire)
        .await?;
    Ok(Json(responses))
}

/// GET /api/responses/counts?questionnaire=... - 按变体的提交计数
pub async fn counts(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<AssignmentCount>>> {
    let counts = state
        .recorder
        .counts_by_assignment(&query.questionnaire)
        .await?;
    Ok(Json(counts))
}

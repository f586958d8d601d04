//! Scan API Handlers

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::Response;
use crate::db::repository::ScanCodeRepository;
use crate::services::{RecordSubmission, ResolvedVariant};
use crate::utils::{AppError, AppResult};

/// 提交载荷：解析端点返回的上下文 + 顾客回答
#[derive(Debug, Deserialize)]
pub struct SubmitPayload {
    pub questionnaire: String,
    pub assignment: String,
    pub answers: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub customer_identifier: Option<String>,
}

/// GET /api/scan/:code - 解析一次扫码
///
/// 每次扫码独立抽签；返回要展示的问卷和本次解析的分配上下文，
/// 提交时原样带回。
pub async fn resolve(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> AppResult<Json<ResolvedVariant>> {
    let resolved = state.resolver.resolve_by_code(&code).await?;
    Ok(Json(resolved))
}

/// POST /api/scan/:code/responses - 提交回答
///
/// 桌台和扫码标识从路径中的码推导，不信任客户端传入。
pub async fn submit(
    State(state): State<ServerState>,
    Path(code): Path<String>,
    Json(payload): Json<SubmitPayload>,
) -> AppResult<Json<Response>> {
    let scan_codes = ScanCodeRepository::new(state.db.clone());
    let scan_code = scan_codes
        .find_by_code(&code)
        .await?
        .ok_or_else(|| AppError::not_found("Unknown scan code"))?;

    let scan_code_id = scan_code
        .id
        .as_ref()
        .ok_or_else(|| AppError::internal("Scan code record without id"))?
        .to_string();

    let response = state
        .recorder
        .record(RecordSubmission {
            dining_table_id: scan_code.dining_table.to_string(),
            questionnaire_id: payload.questionnaire,
            scan_code_id,
            assignment_id: payload.assignment,
            answers: payload.answers,
            customer_identifier: payload.customer_identifier,
        })
        .await?;

    Ok(Json(response))
}

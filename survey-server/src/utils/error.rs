//! 统一错误处理
//!
//! 提供应用级错误类型和响应结构：
//! - [`AppError`] - 应用错误枚举
//! - [`AppResponse`] - API 响应结构
//!
//! # 错误码规范
//!
//! | 错误码 | 分类 | 说明 |
//! |--------|------|------|
//! | E0000 | 成功 | - |
//! | E0002 | 校验失败 | 权重非正数、选项结构非法等 |
//! | E0003 | 资源不存在 | 扫码/问卷/分配已被级联删除 |
//! | E0004 | 冲突 | 扫码已有激活分配 / 唯一约束冲突 |
//! | E0005 | 无可分配目标 | 批量分配时所有桌台均已有分配 |
//! | E0007 | 无可展示问卷 | 解析时无激活分配指向激活问卷 |
//! | E9xxx | 系统错误 | 数据库错误、内部错误 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::db::repository::RepoError;

/// API 统一响应结构
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "Success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// 错误码 (E0000 表示成功)
    pub code: String,
    /// 消息
    pub message: String,
    /// 响应数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 业务逻辑错误 (4xx) ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Assignment conflict: {0}")]
    /// 分配冲突：扫码已有激活分配或 (扫码, 问卷) 对已存在 (409)
    Conflict(String),

    #[error("Nothing to assign: {0}")]
    /// 批量分配无可分配目标 (422)，信息性结果而非系统故障
    AllAssigned(String),

    #[error("No active questionnaire for scan code {0}")]
    /// 解析失败：无激活分配指向激活问卷 (404)，顾客侧显示"暂无内容"
    NoActiveQuestionnaire(String),

    #[error("Validation failed: {0}")]
    /// 校验失败 (400)
    Validation(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Database error: {0}")]
    /// 数据库错误 (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.as_str()),

            // Conflict (409)
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004", msg.as_str()),

            // Nothing eligible for bulk assignment (422)
            AppError::AllAssigned(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "E0005", msg.as_str()),

            // Nothing to show for this scan (404)
            AppError::NoActiveQuestionnaire(_) => (
                StatusCode::NOT_FOUND,
                "E0007",
                "No questionnaire available for this code",
            ),

            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.as_str()),

            // Database errors (500)
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9002", "Database error")
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error",
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message: message.to_string(),
            data: None,
        });

        (status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for application operations
pub type AppResult<T> = Result<T, AppError>;

//! Repository Module
//!
//! Provides storage access for SurrealDB tables. 每个仓储都在数据访问
//! 边界处返回显式类型：单值关系返回 `Option<T>`，多值关系返回有序的
//! `Vec<T>`，从不让存储客户端的歧义形状泄漏给上层。

// Identity
pub mod dining_table;
pub mod restaurant;
pub mod scan_code;

// Engine
pub mod assignment;
pub mod questionnaire;
pub mod response;

// Re-exports
pub use assignment::AssignmentRepository;
pub use dining_table::DiningTableRepository;
pub use questionnaire::QuestionnaireRepository;
pub use response::ResponseRepository;
pub use restaurant::RestaurantRepository;
pub use scan_code::ScanCodeRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // 唯一索引冲突按 Duplicate 返回，调用方映射为 ConflictError
        if msg.contains("already contains") || msg.contains("unique") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "scan_code:abc".parse()?;
//   - 创建: let id = RecordId::from_table_key("scan_code", "abc");
//   - 记录链接字段一律通过 query + bind 写入，避免被序列化为字符串

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

//! Database Module
//!
//! 嵌入式 SurrealDB (RocksDb)。启动时应用表和索引定义；
//! 唯一索引承担规格要求的并发防护：
//! - `(scan_code, questionnaire)` 对至多一条分配 (并发 assign 竞争安全)
//! - 扫码不透明值全局唯一
//! - 每桌台至多一个扫码 (1:1)
//! - 桌台展示名餐厅内唯一

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

/// Database service that owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open the embedded database at `db_path` and apply schema definitions
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns("survey")
            .use_db("main")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        apply_schema(&db).await?;

        tracing::info!("Database ready at {db_path} (embedded SurrealDB, RocksDb)");

        Ok(Self { db })
    }
}

/// Apply table and index definitions (idempotent)
pub async fn apply_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    const SCHEMA: &str = "
        DEFINE TABLE IF NOT EXISTS restaurant SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS dining_table SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS scan_code SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS questionnaire SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS assignment SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS response SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS dining_table_name ON TABLE dining_table COLUMNS restaurant, name UNIQUE;
        DEFINE INDEX IF NOT EXISTS scan_code_code ON TABLE scan_code COLUMNS code UNIQUE;
        DEFINE INDEX IF NOT EXISTS scan_code_table ON TABLE scan_code COLUMNS dining_table UNIQUE;
        DEFINE INDEX IF NOT EXISTS assignment_pair ON TABLE assignment COLUMNS scan_code, questionnaire UNIQUE;
        DEFINE INDEX IF NOT EXISTS assignment_scan_code ON TABLE assignment COLUMNS scan_code;
        DEFINE INDEX IF NOT EXISTS assignment_restaurant ON TABLE assignment COLUMNS restaurant;
        DEFINE INDEX IF NOT EXISTS response_assignment ON TABLE response COLUMNS assignment;
    ";

    db.query(SCHEMA)
        .await
        .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;

    Ok(())
}

//! Scan Code Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::ScanCode;
use crate::utils::time;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct ScanCodeRepository {
    base: BaseRepository,
}

impl ScanCodeRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find scan code by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<ScanCode>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let scan_code: Option<ScanCode> = self.base.db().select(thing).await?;
        Ok(scan_code)
    }

    /// Find scan code by its printed opaque value
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<ScanCode>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM scan_code WHERE code = $code LIMIT 1")
            .bind(("code", code.to_string()))
            .await?;
        let codes: Vec<ScanCode> = result.take(0)?;
        Ok(codes.into_iter().next())
    }

    /// Find the scan code bound to a table (1:1, 显式 Option 单值)
    pub async fn find_by_table(&self, table: &RecordId) -> RepoResult<Option<ScanCode>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM scan_code WHERE dining_table = $table LIMIT 1")
            .bind(("table", table.clone()))
            .await?;
        let codes: Vec<ScanCode> = result.take(0)?;
        Ok(codes.into_iter().next())
    }

    /// Create a scan code for a table with a fresh opaque value
    ///
    /// 不透明值从不原地重生成；重新生成走 delete + create。
    pub async fn create(
        &self,
        dining_table: RecordId,
        restaurant: RecordId,
    ) -> RepoResult<ScanCode> {
        let code = uuid::Uuid::new_v4().to_string();
        let mut result = self
            .base
            .db()
            .query(
                "CREATE scan_code SET code = $code, dining_table = $table, \
                 restaurant = $restaurant, created_at = $created_at",
            )
            .bind(("code", code))
            .bind(("table", dining_table))
            .bind(("restaurant", restaurant))
            .bind(("created_at", time::now_millis()))
            .await?;
        let created: Vec<ScanCode> = result.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create scan code".to_string()))
    }

    /// Hard delete a scan code with cascade
    ///
    /// 旧分配随扫码一起级联删除；回答保留 (引用已删除扫码的历史数据)。
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.base
            .db()
            .query(
                "BEGIN TRANSACTION;
                 DELETE assignment WHERE scan_code = $thing;
                 DELETE $thing;
                 COMMIT TRANSACTION;",
            )
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}

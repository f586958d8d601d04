//! Assignment Repository
//!
//! (scan_code, questionnaire) 唯一索引由 schema 保证：并发创建同一对
//! 分配时，后到者收到 Duplicate 错误而不是写入重复行。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Assignment, AssignmentCreate};
use crate::utils::time;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct AssignmentRepository {
    base: BaseRepository,
}

impl AssignmentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find assignment by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Assignment>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let assignment: Option<Assignment> = self.base.db().select(thing).await?;
        Ok(assignment)
    }

    /// Find all assignments for a scan code (active and inactive, for audit)
    pub async fn find_by_scan_code(&self, scan_code: &RecordId) -> RepoResult<Vec<Assignment>> {
        let assignments: Vec<Assignment> = self
            .base
            .db()
            .query("SELECT * FROM assignment WHERE scan_code = $scan_code ORDER BY created_at")
            .bind(("scan_code", scan_code.clone()))
            .await?
            .take(0)?;
        Ok(assignments)
    }

    /// Find active assignments for a scan code
    pub async fn find_active_by_scan_code(
        &self,
        scan_code: &RecordId,
    ) -> RepoResult<Vec<Assignment>> {
        let assignments: Vec<Assignment> = self
            .base
            .db()
            .query(
                "SELECT * FROM assignment WHERE scan_code = $scan_code \
                 AND is_active = true ORDER BY created_at",
            )
            .bind(("scan_code", scan_code.clone()))
            .await?
            .take(0)?;
        Ok(assignments)
    }

    /// Find all assignments in a restaurant
    pub async fn find_by_restaurant(&self, restaurant: &RecordId) -> RepoResult<Vec<Assignment>> {
        let assignments: Vec<Assignment> = self
            .base
            .db()
            .query("SELECT * FROM assignment WHERE restaurant = $restaurant ORDER BY created_at")
            .bind(("restaurant", restaurant.clone()))
            .await?
            .take(0)?;
        Ok(assignments)
    }

    /// Find active assignments in a restaurant belonging to *other* scan codes
    ///
    /// 传播用：新扫码继承餐厅内其余扫码的当前变体组合。
    pub async fn find_active_in_restaurant_excluding(
        &self,
        restaurant: &RecordId,
        exclude_scan_code: &RecordId,
    ) -> RepoResult<Vec<Assignment>> {
        let assignments: Vec<Assignment> = self
            .base
            .db()
            .query(
                "SELECT * FROM assignment WHERE restaurant = $restaurant \
                 AND scan_code != $exclude AND is_active = true ORDER BY created_at",
            )
            .bind(("restaurant", restaurant.clone()))
            .bind(("exclude", exclude_scan_code.clone()))
            .await?
            .take(0)?;
        Ok(assignments)
    }

    /// Create a new active assignment
    ///
    /// 记录链接字段通过 bind 写入；唯一索引冲突映射为 Duplicate。
    pub async fn create(&self, data: AssignmentCreate) -> RepoResult<Assignment> {
        let mut result = self
            .base
            .db()
            .query(
                "CREATE assignment SET scan_code = $scan_code, questionnaire = $questionnaire, \
                 restaurant = $restaurant, weight = $weight, is_active = true, \
                 created_at = $created_at",
            )
            .bind(("scan_code", data.scan_code))
            .bind(("questionnaire", data.questionnaire))
            .bind(("restaurant", data.restaurant))
            .bind(("weight", data.weight))
            .bind(("created_at", time::now_millis()))
            .await?;
        let created: Vec<Assignment> = result.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create assignment".to_string()))
    }

    /// Create a batch of assignments in a single transaction
    ///
    /// 传播路径用：要么全部写入，要么全部回滚。
    pub async fn create_many(&self, batch: Vec<AssignmentCreate>) -> RepoResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut statements = String::from("BEGIN TRANSACTION;\n");
        for i in 0..batch.len() {
            statements.push_str(&format!(
                "CREATE assignment SET scan_code = $sc{i}, questionnaire = $q{i}, \
                 restaurant = $r{i}, weight = $w{i}, is_active = true, created_at = $t;\n"
            ));
        }
        statements.push_str("COMMIT TRANSACTION;");

        let mut query = self.base.db().query(statements).bind(("t", time::now_millis()));
        for (i, data) in batch.into_iter().enumerate() {
            query = query
                .bind((format!("sc{i}"), data.scan_code))
                .bind((format!("q{i}"), data.questionnaire))
                .bind((format!("r{i}"), data.restaurant))
                .bind((format!("w{i}"), data.weight));
        }
        query.await?.check()?;
        Ok(())
    }

    /// Soft-deactivate an assignment (preserves history for analysis)
    pub async fn deactivate(&self, id: &str) -> RepoResult<Assignment> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $thing SET is_active = false, deactivated_at = $deactivated_at \
                 RETURN AFTER",
            )
            .bind(("thing", thing))
            .bind(("deactivated_at", time::now_millis()))
            .await?;
        let updated: Vec<Assignment> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Assignment {} not found", id)))
    }

    /// Hard delete an assignment
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }

    /// Hard delete all of a restaurant's assignments for a questionnaire
    ///
    /// Returns the number of assignments removed.
    pub async fn delete_by_questionnaire_in_restaurant(
        &self,
        questionnaire: &RecordId,
        restaurant: &RecordId,
    ) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query(
                "DELETE assignment WHERE questionnaire = $questionnaire \
                 AND restaurant = $restaurant RETURN BEFORE",
            )
            .bind(("questionnaire", questionnaire.clone()))
            .bind(("restaurant", restaurant.clone()))
            .await?;
        let removed: Vec<Assignment> = result.take(0)?;
        Ok(removed.len() as u64)
    }
}

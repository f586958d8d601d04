//! Response Repository
//!
//! 回答创建后不可变：本仓储不提供 update 或 delete 路径，
//! 级联删除只发生在祖先实体的删除事务里。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Response;
use serde::Serialize;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

#[derive(Clone)]
pub struct ResponseRepository {
    base: BaseRepository,
}

/// Per-assignment submission count (变体计数，供下游分析导出)
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct AssignmentCount {
    #[serde(with = "crate::db::models::serde_helpers::record_id")]
    pub assignment: RecordId,
    pub count: u64,
}

impl ResponseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a submission
    pub async fn create(&self, response: Response) -> RepoResult<Response> {
        let mut result = self
            .base
            .db()
            .query(
                "CREATE response SET restaurant = $restaurant, dining_table = $dining_table, \
                 scan_code = $scan_code, questionnaire = $questionnaire, \
                 assignment = $assignment, answers = $answers, stale_keys = $stale_keys, \
                 customer_identifier = $customer_identifier, submitted_at = $submitted_at",
            )
            .bind(("restaurant", response.restaurant))
            .bind(("dining_table", response.dining_table))
            .bind(("scan_code", response.scan_code))
            .bind(("questionnaire", response.questionnaire))
            .bind(("assignment", response.assignment))
            .bind(("answers", response.answers))
            .bind(("stale_keys", response.stale_keys))
            .bind(("customer_identifier", response.customer_identifier))
            .bind(("submitted_at", response.submitted_at.to_rfc3339()))
            .await?;
        let created: Vec<Response> = result.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create response".to_string()))
    }

    /// Find all responses for a questionnaire, newest first
    pub async fn find_by_questionnaire(
        &self,
        questionnaire: &RecordId,
    ) -> RepoResult<Vec<Response>> {
        let responses: Vec<Response> = self
            .base
            .db()
            .query(
                "SELECT * FROM response WHERE questionnaire = $questionnaire \
                 ORDER BY submitted_at DESC",
            )
            .bind(("questionnaire", questionnaire.clone()))
            .await?
            .take(0)?;
        Ok(responses)
    }

    /// Count submissions per assignment for a questionnaire
    pub async fn count_by_assignment(
        &self,
        questionnaire: &RecordId,
    ) -> RepoResult<Vec<AssignmentCount>> {
        let counts: Vec<AssignmentCount> = self
            .base
            .db()
            .query(
                "SELECT assignment, count() AS count FROM response \
                 WHERE questionnaire = $questionnaire GROUP BY assignment",
            )
            .bind(("questionnaire", questionnaire.clone()))
            .await?
            .take(0)?;
        Ok(counts)
    }
}

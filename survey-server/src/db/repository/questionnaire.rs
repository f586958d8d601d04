//! Questionnaire Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Questionnaire, QuestionnaireCreate, QuestionnaireUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "questionnaire";

#[derive(Clone)]
pub struct QuestionnaireRepository {
    base: BaseRepository,
}

impl QuestionnaireRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all questionnaires
    pub async fn find_all(&self) -> RepoResult<Vec<Questionnaire>> {
        let questionnaires: Vec<Questionnaire> = self
            .base
            .db()
            .query("SELECT * FROM questionnaire ORDER BY title")
            .await?
            .take(0)?;
        Ok(questionnaires)
    }

    /// Find questionnaire by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Questionnaire>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let questionnaire: Option<Questionnaire> = self.base.db().select(thing).await?;
        Ok(questionnaire)
    }

    /// Find active questionnaires among the given ids
    ///
    /// 解析路径用：激活分配引用的问卷必须自身也处于激活状态。
    pub async fn find_active_by_ids(&self, ids: Vec<RecordId>) -> RepoResult<Vec<Questionnaire>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let questionnaires: Vec<Questionnaire> = self
            .base
            .db()
            .query("SELECT * FROM questionnaire WHERE id IN $ids AND is_active = true")
            .bind(("ids", ids))
            .await?
            .take(0)?;
        Ok(questionnaires)
    }

    /// Create a new questionnaire
    pub async fn create(&self, data: QuestionnaireCreate) -> RepoResult<Questionnaire> {
        let questionnaire = Questionnaire {
            id: None,
            title: data.title,
            description: data.description,
            is_active: true,
            questions: data.questions,
        };
        let created: Option<Questionnaire> =
            self.base.db().create(TABLE).content(questionnaire).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create questionnaire".to_string()))
    }

    /// Update a questionnaire
    pub async fn update(&self, id: &str, data: QuestionnaireUpdate) -> RepoResult<Questionnaire> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Questionnaire {} not found", id)))?;

        let updated = Questionnaire {
            id: existing.id,
            title: data.title.unwrap_or(existing.title),
            description: data.description.unwrap_or(existing.description),
            is_active: data.is_active.unwrap_or(existing.is_active),
            questions: data.questions.unwrap_or(existing.questions),
        };

        let result: Option<Questionnaire> =
            self.base.db().update(thing).content(updated).await?;
        result.ok_or_else(|| RepoError::NotFound(format!("Questionnaire {} not found", id)))
    }

    /// Hard delete a questionnaire with cascade
    ///
    /// 级联删除引用它的所有分配和回答。
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.base
            .db()
            .query(
                "BEGIN TRANSACTION;
                 DELETE response WHERE questionnaire = $thing;
                 DELETE assignment WHERE questionnaire = $thing;
                 DELETE $thing;
                 COMMIT TRANSACTION;",
            )
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}

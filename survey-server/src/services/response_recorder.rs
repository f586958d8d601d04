//! Response Recorder
//!
//! 持久化一次完整提交，并带上足够的上下文供下游按变体分析。
//! 回答一经写入即不可变：没有任何更新或删除路径。

use std::collections::{BTreeMap, HashSet};

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{info, warn};

use crate::db::models::Response;
use crate::db::repository::{
    AssignmentRepository, DiningTableRepository, QuestionnaireRepository, ResponseRepository,
    ScanCodeRepository,
};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult, time};

/// 提交载荷 (解析端点返回的上下文 + 顾客回答)
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RecordSubmission {
    pub dining_table_id: String,
    pub questionnaire_id: String,
    pub scan_code_id: String,
    pub assignment_id: String,
    pub answers: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub customer_identifier: Option<String>,
}

#[derive(Clone)]
pub struct ResponseRecorder {
    responses: ResponseRepository,
    questionnaires: QuestionnaireRepository,
    assignments: AssignmentRepository,
    scan_codes: ScanCodeRepository,
    tables: DiningTableRepository,
}

impl ResponseRecorder {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            responses: ResponseRepository::new(db.clone()),
            questionnaires: QuestionnaireRepository::new(db.clone()),
            assignments: AssignmentRepository::new(db.clone()),
            scan_codes: ScanCodeRepository::new(db.clone()),
            tables: DiningTableRepository::new(db),
        }
    }

    /// 记录一次提交
    ///
    /// 回答键对照问卷当前定义的问题 id 校验。问卷可能在解析和提交
    /// 之间被编辑过：解析时存在、现在已删除的问题 id 仍然接受，但
    /// 记入 `stale_keys` 标记。提交时间由服务端生成，固定报表时区。
    pub async fn record(&self, submission: RecordSubmission) -> AppResult<Response> {
        if submission.answers.is_empty() {
            return Err(AppError::validation("answers must not be empty"));
        }
        validate_optional_text(
            &submission.customer_identifier,
            "customer_identifier",
            MAX_SHORT_TEXT_LEN,
        )?;

        let table = self
            .tables
            .find_by_id(&submission.dining_table_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Table {} not found", submission.dining_table_id))
            })?;
        let scan_code = self
            .scan_codes
            .find_by_id(&submission.scan_code_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Scan code {} not found", submission.scan_code_id))
            })?;
        let questionnaire = self
            .questionnaires
            .find_by_id(&submission.questionnaire_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Questionnaire {} not found",
                    submission.questionnaire_id
                ))
            })?;
        let assignment = self
            .assignments
            .find_by_id(&submission.assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Assignment {} not found",
                    submission.assignment_id
                ))
            })?;

        // 解析时的分配必须属于提交的扫码
        let scan_code_ref = scan_code
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Scan code record without id"))?;
        if assignment.scan_code != scan_code_ref {
            return Err(AppError::validation(format!(
                "Assignment {} does not belong to scan code {}",
                submission.assignment_id, submission.scan_code_id
            )));
        }

        // 防御性校验：当前问卷快照中不存在的键接受但标记
        let known_ids: HashSet<&str> = questionnaire.question_ids().collect();
        let stale_keys: Vec<String> = submission
            .answers
            .keys()
            .filter(|k| !known_ids.contains(k.as_str()))
            .cloned()
            .collect();
        if !stale_keys.is_empty() {
            warn!(
                questionnaire = %submission.questionnaire_id,
                stale = ?stale_keys,
                "Submission contains answer keys no longer present in questionnaire"
            );
        }

        let response = Response {
            id: None,
            restaurant: table.restaurant.clone(),
            dining_table: table
                .id
                .ok_or_else(|| AppError::internal("Table record without id"))?,
            scan_code: scan_code_ref,
            questionnaire: questionnaire
                .id
                .ok_or_else(|| AppError::internal("Questionnaire record without id"))?,
            assignment: assignment
                .id
                .ok_or_else(|| AppError::internal("Assignment record without id"))?,
            answers: submission.answers,
            stale_keys,
            customer_identifier: submission.customer_identifier,
            submitted_at: time::reporting_now(),
        };

        let created = self.responses.create(response).await?;

        info!(
            questionnaire = %submission.questionnaire_id,
            assignment = %submission.assignment_id,
            "Response recorded"
        );

        Ok(created)
    }

    /// 问卷的全部回答，最新在前
    pub async fn list_for_questionnaire(&self, questionnaire_id: &str) -> AppResult<Vec<Response>> {
        let questionnaire: RecordId = questionnaire_id.parse().map_err(|_| {
            AppError::validation(format!("Invalid questionnaire ID: {questionnaire_id}"))
        })?;
        self.responses
            .find_by_questionnaire(&questionnaire)
            .await
            .map_err(Into::into)
    }

    /// 问卷按分配 (变体) 的提交计数
    pub async fn counts_by_assignment(
        &self,
        questionnaire_id: &str,
    ) -> AppResult<Vec<crate::db::repository::response::AssignmentCount>> {
        let questionnaire: RecordId = questionnaire_id.parse().map_err(|_| {
            AppError::validation(format!("Invalid questionnaire ID: {questionnaire_id}"))
        })?;
        self.responses
            .count_by_assignment(&questionnaire)
            .await
            .map_err(Into::into)
    }
}

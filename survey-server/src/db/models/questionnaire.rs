//! Questionnaire Model
//!
//! 可复用的问卷定义。问题列表作为半结构化文档字段存储，
//! 问题集合可以演进而无需迁移固定列。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Questionnaire entity (问卷)
///
/// 独立实体；可以被多家餐厅的多个扫码引用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Questionnaire {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// 有序问题列表
    #[serde(default)]
    pub questions: Vec<Question>,
}

fn default_true() -> bool {
    true
}

impl Questionnaire {
    /// 问卷内定义的问题 id 集合 (回答键校验用)
    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.id.as_str())
    }
}

/// 单个问题定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// 问题标识 (问卷内唯一，回答以此为键)
    pub id: String,
    /// 展示给顾客的问题文本
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// 问题类型：多选 (2-5 个选项) 或自由文本
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice { options: Vec<ChoiceOption> },
    FreeText,
}

/// 多选题的一个选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// 存储在回答中的值
    pub value: String,
    /// 展示给顾客的标签
    pub label: String,
}

/// Create questionnaire payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

/// Update questionnaire payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Question>>,
}

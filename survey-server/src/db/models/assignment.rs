//! Assignment Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Assignment entity (问卷分配)
///
/// ScanCode 与 Questionnaire 之间的多对多关联，A/B 实验配置的基本
/// 单位。每个 (scan_code, questionnaire) 对至多一条记录，由唯一索引
/// 保证。权重为正整数，作为未归一化的概率质量参与加权随机选择。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub scan_code: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub questionnaire: RecordId,
    /// Restaurant scope (显式作用域，传播和批量操作均以此过滤)
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    /// 相对概率权重 (正整数)
    pub weight: i64,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// 创建时间 (Unix millis)
    #[serde(default)]
    pub created_at: i64,
    /// 停用时间 (Unix millis)，软停用时写入
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<i64>,
}

fn default_true() -> bool {
    true
}

/// Create assignment payload (内部使用，由服务层构造)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentCreate {
    #[serde(with = "serde_helpers::record_id")]
    pub scan_code: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub questionnaire: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    pub weight: i64,
}

//! Response Model

use std::collections::BTreeMap;

use super::serde_helpers;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Response entity (顾客提交)
///
/// 一次提交对应一条记录，创建后不可变更或删除。关键字段是
/// `assignment`：记录本次访问解析出的具体分配，供下游按变体分析。
/// 回答以问题 id 为键的半结构化映射存储。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub dining_table: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub scan_code: RecordId,
    #[serde(with = "serde_helpers::record_id")]
    pub questionnaire: RecordId,
    /// 本次访问解析出的分配
    #[serde(with = "serde_helpers::record_id")]
    pub assignment: RecordId,
    /// 回答映射：问题 id → 回答值
    pub answers: BTreeMap<String, serde_json::Value>,
    /// 提交时问卷中已不存在的回答键 (接受但标记)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_keys: Vec<String>,
    /// 可选的顾客标识 (仅存储，不用于粘性分配)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_identifier: Option<String>,
    /// 服务端提交时间，固定报表时区 (+08:00)
    pub submitted_at: DateTime<FixedOffset>,
}

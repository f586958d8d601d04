//! Scan Code Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Scan code entity (桌台二维码)
///
/// 与桌台 1:1 绑定，携带永久的全局唯一不透明值。不透明值从不原地
/// 重新生成："重新生成"建模为删除旧记录并创建新记录，旧分配随之
/// 级联删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanCode {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// 印刷在码上的不透明值 (全局唯一)
    pub code: String,
    /// Dining table reference (1:1)
    #[serde(with = "serde_helpers::record_id")]
    pub dining_table: RecordId,
    /// Restaurant reference (冗余存储，用于餐厅级传播查询)
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
    /// 创建时间 (Unix millis)
    #[serde(default)]
    pub created_at: i64,
}

//! Dining Table Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Dining table entity (桌台)
///
/// 属于唯一一个餐厅；展示名在餐厅内唯一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// 展示名 (自由文本，餐厅内唯一)
    pub name: String,
    /// Restaurant reference
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub name: String,
    #[serde(with = "serde_helpers::record_id")]
    pub restaurant: RecordId,
}

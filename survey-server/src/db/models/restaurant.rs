//! Restaurant Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Restaurant entity (餐厅)
///
/// 所有分配和传播操作都显式以餐厅为作用域，避免跨租户泄漏。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
}

/// Create restaurant payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantCreate {
    pub name: String,
}

//! 业务服务层 - 分配与解析引擎
//!
//! - [`AssignmentManager`]: 维护每个扫码的分配集合，向新扫码传播
//!   餐厅现有的变体组合
//! - [`VariantResolver`]: 扫码时加权随机选出恰好一个问卷变体
//! - [`ResponseRecorder`]: 持久化顾客提交并标记产生它的分配

pub mod assignment_manager;
pub mod response_recorder;
pub mod variant_resolver;

pub use assignment_manager::{AssignmentManager, BulkAssignOutcome, SkippedTable};
pub use response_recorder::{RecordSubmission, ResponseRecorder};
pub use variant_resolver::{ResolvedVariant, VariantResolver, pick_weighted};

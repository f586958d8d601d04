//! Survey Server - 扫码问卷分发服务
//!
//! 顾客扫描桌台二维码后收到问卷；员工为桌台配置问卷，包括
//! 加权 A/B 实验。核心是分配与解析引擎：
//!
//! - **分配管理** (`services::AssignmentManager`): 维护扫码与问卷之间的
//!   加权绑定，新扫码自动继承餐厅现有的实验组合
//! - **变体解析** (`services::VariantResolver`): 扫码时按权重随机选出
//!   恰好一个问卷变体
//! - **回答记录** (`services::ResponseRecorder`): 持久化顾客提交，
//!   永久标记产生它的分配记录
//!
//! # 模块结构
//!
//! ```text
//! survey-server/src/
//! ├── core/          # 配置、状态、HTTP 服务器
//! ├── db/            # 嵌入式 SurrealDB、模型、仓储
//! ├── services/      # 分配/解析/记录引擎
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志、校验、时间
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use services::{AssignmentManager, ResponseRecorder, VariantResolver};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

//! 工具模块 - 通用工具函数和类型
//!
//! - [`AppError`] / [`AppResult`] - 应用错误类型
//! - [`logger`] - 日志初始化
//! - [`time`] - 报表时区 (UTC+8) 时间工具
//! - [`validation`] - 字段级输入校验

pub mod error;
pub mod logger;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResponse, AppResult};

// ==========================================
// SINAPI 预算系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行调用
// ==========================================

pub mod budget_api;
pub mod error;
pub mod import_api;

// 重导出核心类型
pub use budget_api::BudgetApi;
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;

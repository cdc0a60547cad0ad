// ==========================================
// SINAPI 预算系统 - 领域模型层
// ==========================================
// 职责: 定义价格目录与预算实体
// 红线: 不含数据访问逻辑
// ==========================================

pub mod budget;
pub mod catalog;

// 重导出核心类型
pub use budget::{BudgetLine, BudgetSummary, LineKind, Project, DEFAULT_MARKUP_PCT};
pub use catalog::{
    CatalogEntry, ComponentDetail, ComponentLink, CompositeItem, Item, DEFAULT_SOURCE,
};

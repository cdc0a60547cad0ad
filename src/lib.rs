// ==========================================
// SINAPI 预算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + calamine
// 系统定位: SINAPI 价格表导入 + 工程预算
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 应用配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/存储句柄）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    BudgetLine, BudgetSummary, CatalogEntry, ComponentDetail, ComponentLink, CompositeItem, Item,
    LineKind, Project,
};

// 存储与导入
pub use db::Store;
pub use importer::{CatalogImporter, CatalogImporterImpl, ImportReport};

// API
pub use api::{ApiError, BudgetApi, ImportApi};

// 配置
pub use config::AppConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "SINAPI 预算系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

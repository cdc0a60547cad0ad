// ==========================================
// SINAPI 预算系统 - 配置层
// ==========================================
// 职责: 应用配置加载,支持 JSON 文件与环境变量覆写
// ==========================================

pub mod app_config;

// 重导出核心配置
pub use app_config::{
    get_default_db_path, AppConfig, ConfigError, ConfigResult, ImportSettings, LogFormat,
    ENV_CONFIG_PATH, ENV_DB_PATH,
};

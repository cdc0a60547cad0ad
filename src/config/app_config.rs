// ==========================================
// SINAPI 预算系统 - 应用配置
// ==========================================
// 加载顺序: 内置默认值 → JSON 配置文件（可选）→ 环境变量
// 环境变量:
// - SINAPI_BUDGET_CONFIG: 配置文件路径
// - SINAPI_BUDGET_DB_PATH: 数据库路径（优先级最高）
// ==========================================

use crate::domain::budget::DEFAULT_MARKUP_PCT;
use crate::domain::catalog::DEFAULT_SOURCE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const ENV_CONFIG_PATH: &str = "SINAPI_BUDGET_CONFIG";
pub const ENV_DB_PATH: &str = "SINAPI_BUDGET_DB_PATH";

const DB_FILE_NAME: &str = "orcamento.db";
const DATA_DIR_NAME: &str = "sinapi-budget";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(String),

    #[error("配置文件读取失败: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("配置文件格式错误: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("配置值非法: {0}")]
    InvalidValue(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

// ==========================================
// ImportSettings - 导入设置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// 写入记录的来源标记
    pub source_tag: String,
    /// 条目工作表名猜测（按顺序尝试）
    pub item_sheets: Vec<String>,
    /// 组合工作表名猜测（按顺序尝试）
    pub composite_sheets: Vec<String>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            source_tag: DEFAULT_SOURCE.to_string(),
            item_sheets: vec!["insumos".to_string(), "Insumos".to_string()],
            composite_sheets: vec!["Composicoes".to_string(), "composicoes".to_string()],
        }
    }
}

// ==========================================
// AppConfig - 应用配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 数据库路径（None 时使用默认数据目录）
    pub db_path: Option<String>,
    pub import: ImportSettings,
    /// 新项目的加价百分比
    pub default_markup_pct: f64,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            import: ImportSettings::default(),
            default_markup_pct: DEFAULT_MARKUP_PCT,
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// 加载配置
    ///
    /// # 参数
    /// - config_path: 显式配置文件路径; None 时读取 SINAPI_BUDGET_CONFIG,
    ///   仍未指定则只使用默认值
    ///
    /// # 返回
    /// - Err(NotFound): 显式指定的文件不存在
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let env_path = std::env::var(ENV_CONFIG_PATH)
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let mut config = match config_path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("未指定配置文件,使用默认配置");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件读取（缺失字段取默认值）
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        info!(path = %path.display(), "配置文件已加载");
        Ok(config)
    }

    /// 应用环境覆写（lookup 便于测试注入）
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                debug!(db_path = %trimmed, "数据库路径由环境变量覆写");
                self.db_path = Some(trimmed.to_string());
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.default_markup_pct.is_finite() || self.default_markup_pct < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "default_markup_pct = {}",
                self.default_markup_pct
            )));
        }
        if self.import.item_sheets.is_empty() || self.import.composite_sheets.is_empty() {
            return Err(ConfigError::InvalidValue(
                "工作表名猜测列表不能为空".to_string(),
            ));
        }
        Ok(())
    }

    /// 实际使用的数据库路径
    pub fn resolved_db_path(&self) -> String {
        match &self.db_path {
            Some(path) => path.clone(),
            None => get_default_db_path(),
        }
    }
}

/// 默认数据库路径
///
/// 优先 SINAPI_BUDGET_DB_PATH,其次用户数据目录,最后当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(ENV_DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(".").join(DB_FILE_NAME);

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join(DATA_DIR_NAME);
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DB_FILE_NAME);
        }
    }

    path.to_string_lossy().to_string()
}

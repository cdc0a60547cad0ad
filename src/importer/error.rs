// ==========================================
// SINAPI 预算系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 表头未找到/必需列缺失不是错误,以 ImportAbort 形式
// 放在 ImportReport 中返回（调用方可继续尝试其他工作表）
// ==========================================

use crate::importer::column_resolver::Field;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xlsb/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作表不存在: {sheet}（可用: {}）", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    // ===== 落库错误 =====
    #[error("导入落库失败: {0}")]
    Storage(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// ImportAbort - 导入中止原因
// ==========================================
// 中止时本次调用零写入,计数为 0
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportAbort {
    #[error("工作表 {sheet} 中未找到表头行")]
    HeaderNotFound { sheet: String },

    #[error("工作表 {sheet} 缺少必需列: {}", missing.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", "))]
    RequiredColumnsMissing { sheet: String, missing: Vec<Field> },
}

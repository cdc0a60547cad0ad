// ==========================================
// SINAPI 预算系统 - 导入报告
// ==========================================

use crate::importer::error::ImportAbort;
use crate::importer::value_normalizer::CoercionWarning;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 导入类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Items,
    Composites,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Items => write!(f, "items"),
            ImportKind::Composites => write!(f, "composites"),
        }
    }
}

/// 单次导入调用的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub kind: ImportKind,
    pub sheet: String,
    pub reference_period: String,
    /// 表头行下标（中止于表头检测时为 None）
    pub header_row: Option<usize>,
    /// 写入的顶层记录数（条目行数 / 去重后的组合数）
    pub records: usize,
    /// 写入的组件关系数（仅组合导入）
    pub links: usize,
    /// 因缺少标识字段而跳过的行数
    pub skipped_rows: usize,
    pub warnings: Vec<CoercionWarning>,
    pub abort: Option<ImportAbort>,
}

impl ImportReport {
    pub(crate) fn new(batch_id: String, kind: ImportKind, sheet: &str, reference_period: &str) -> Self {
        Self {
            batch_id,
            kind,
            sheet: sheet.to_string(),
            reference_period: reference_period.to_string(),
            header_row: None,
            records: 0,
            links: 0,
            skipped_rows: 0,
            warnings: Vec::new(),
            abort: None,
        }
    }

    /// 对外计数: 中止时恒为 0
    pub fn count(&self) -> usize {
        if self.abort.is_some() {
            0
        } else {
            self.records
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }
}

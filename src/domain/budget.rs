// ==========================================
// SINAPI 预算系统 - 项目与预算行领域模型
// ==========================================
// 对齐: projects / budget_lines 表
// 说明: 预算行在插入时快照 description/unit/unit_price,
// 之后目录重新导入不会回写
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 新项目默认加价百分比（BDI）
pub const DEFAULT_MARKUP_PCT: f64 = 25.0;

// ==========================================
// LineKind - 预算行类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Item,
    Composite,
}

impl LineKind {
    /// 数据库存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            LineKind::Item => "insumo",
            LineKind::Composite => "composicao",
        }
    }

    /// 从数据库值解析（兼容英文写法）
    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "insumo" | "item" => Some(LineKind::Item),
            "composicao" | "composite" => Some(LineKind::Composite),
            _ => None,
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKind::Item => write!(f, "item"),
            LineKind::Composite => write!(f, "composite"),
        }
    }
}

impl FromStr for LineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LineKind::from_db_str(s).ok_or_else(|| format!("未知的预算行类型: {}", s))
    }
}

// ==========================================
// Project - 预算项目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_on: String,
    pub updated_on: String,
    pub markup_pct: f64,
    pub saved: bool,
}

// ==========================================
// BudgetLine - 预算行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub id: Option<i64>, // 插入前为 None
    pub project_id: i64,
    pub kind: LineKind,
    pub code: String,
    pub description: String, // 快照
    pub unit: String,        // 快照
    pub quantity: f64,
    pub unit_price: f64, // 快照
}

impl BudgetLine {
    /// 行合计（数量 × 单价）
    pub fn total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

// ==========================================
// BudgetSummary - 预算汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub project_id: i64,
    pub line_count: usize,
    pub subtotal: f64,
    pub markup_pct: f64,
    pub markup_amount: f64,
    pub total: f64,
}

impl BudgetSummary {
    /// 由未加价小计与加价百分比计算汇总
    pub fn compute(project_id: i64, line_count: usize, subtotal: f64, markup_pct: f64) -> Self {
        let markup_amount = subtotal * markup_pct / 100.0;
        Self {
            project_id,
            line_count,
            subtotal,
            markup_pct,
            markup_amount,
            total: subtotal + markup_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_kind_db_roundtrip() {
        assert_eq!(LineKind::from_db_str("insumo"), Some(LineKind::Item));
        assert_eq!(LineKind::from_db_str("COMPOSICAO"), Some(LineKind::Composite));
        assert_eq!(LineKind::from_db_str("composite"), Some(LineKind::Composite));
        assert_eq!(LineKind::from_db_str("other"), None);
        assert_eq!(LineKind::Item.to_db_str(), "insumo");
    }

    #[test]
    fn test_line_total() {
        let line = BudgetLine {
            id: None,
            project_id: 1,
            kind: LineKind::Item,
            code: "001".to_string(),
            description: "Cimento".to_string(),
            unit: "kg".to_string(),
            quantity: 10.0,
            unit_price: 0.85,
        };
        assert!((line.total() - 8.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_applies_markup() {
        let summary = BudgetSummary::compute(7, 3, 1000.0, DEFAULT_MARKUP_PCT);
        assert_eq!(summary.markup_amount, 250.0);
        assert_eq!(summary.total, 1250.0);
        assert_eq!(summary.line_count, 3);
    }

    #[test]
    fn test_summary_zero_markup() {
        let summary = BudgetSummary::compute(1, 0, 0.0, 0.0);
        assert_eq!(summary.total, 0.0);
    }
}

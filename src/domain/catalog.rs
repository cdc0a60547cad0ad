// ==========================================
// SINAPI 预算系统 - 价格目录领域模型
// ==========================================
// 对齐: items / composites / composite_links 表
// 用途: 导入层写入,预算层只读
// ==========================================

use serde::{Deserialize, Serialize};

/// 默认来源标记
pub const DEFAULT_SOURCE: &str = "SINAPI";

// ==========================================
// Item - 单价条目（insumo）
// ==========================================
// 红线: 同一 code 重复导入时整行覆盖（last-write-wins）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub code: String,             // 条目编码（主键）
    pub description: String,      // 描述
    pub unit: String,             // 计量单位
    pub reference_price: f64,     // 参考价（中位价）
    pub source: String,           // 来源标记（SINAPI）
    pub reference_period: String, // 参考期（YYYY-MM）
    pub updated_on: String,       // 最近导入日期（YYYY-MM-DD）
}

// ==========================================
// CompositeItem - 组合条目（composição）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeItem {
    pub code: String,
    pub description: String,
    pub unit: String,
    pub total_cost: f64, // 汇总成本
    pub source: String,
    pub reference_period: String,
    pub updated_on: String,
}

// ==========================================
// ComponentLink - 组合 → 组件 关系
// ==========================================
// 说明: component_code 可能指向 Item 或另一个 CompositeItem,
// 读取时通过回退 JOIN 解析,写入时不校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLink {
    pub composite_code: String,
    pub component_code: String,
    pub coefficient: f64, // 每单位组合消耗的组件数量
}

/// 组件明细（读模型）
///
/// description/unit/unit_price 来自 items,找不到时回退到 composites;
/// 两边都找不到则为 None。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDetail {
    pub component_code: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub coefficient: f64,
    pub unit_price: Option<f64>,
}

impl ComponentDetail {
    /// 组件对组合单价的贡献（系数 × 单价）
    pub fn cost_share(&self) -> f64 {
        self.coefficient * self.unit_price.unwrap_or(0.0)
    }
}

/// 目录检索结果（条目与组合共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub description: String,
    pub unit: String,
    pub price: f64,
    pub reference_period: String,
}

impl From<Item> for CatalogEntry {
    fn from(item: Item) -> Self {
        Self {
            code: item.code,
            description: item.description,
            unit: item.unit,
            price: item.reference_price,
            reference_period: item.reference_period,
        }
    }
}

impl From<CompositeItem> for CatalogEntry {
    fn from(composite: CompositeItem) -> Self {
        Self {
            code: composite.code,
            description: composite.description,
            unit: composite.unit,
            price: composite.total_cost,
            reference_period: composite.reference_period,
        }
    }
}

// ==========================================
// SINAPI 预算系统 - 列解析器
// ==========================================
// 职责: 表头标签 → 标准字段 → 物理列下标
// 规则:
// 1. 严格轮: 所有字段按顺序尝试 strict 模式,全部跑完才进入宽松轮
// 2. 宽松轮: 仅对未解析字段尝试 loose 模式;
//    exclusive 表中严格轮占用的列不可再分配,宽松字段之间互不排斥
// 说明: 新增可接受标签只需修改 alias_table,不改本模块逻辑
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ==========================================
// Field - 标准字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // ===== 单价条目 =====
    Code,
    Description,
    Unit,
    ReferencePrice,

    // ===== 组合表 =====
    CompositeCode,
    CompositeDescription,
    CompositeUnit,
    TotalCost,
    ComponentCode,
    ComponentKind,
    ComponentDescription,
    ComponentUnit,
    Coefficient,
}

impl Field {
    /// 标准字段名
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Code => "codigo",
            Field::Description => "descricao",
            Field::Unit => "unidade",
            Field::ReferencePrice => "preco_mediano",
            Field::CompositeCode => "codigo_composicao",
            Field::CompositeDescription => "descricao_composicao",
            Field::CompositeUnit => "unidade_composicao",
            Field::TotalCost => "custo_total",
            Field::ComponentCode => "codigo_item",
            Field::ComponentKind => "tipo_item",
            Field::ComponentDescription => "descricao_item",
            Field::ComponentUnit => "unidade_item",
            Field::Coefficient => "coeficiente",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// Pattern - 标签匹配模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// 标签（大写、trim 后）完全等于
    Exact(&'static str),
    /// 标签同时包含全部子串
    AllOf(&'static [&'static str]),
}

impl Pattern {
    /// label 需已大写并 trim
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Pattern::Exact(expected) => label == *expected,
            Pattern::AllOf(markers) => markers.iter().all(|m| label.contains(m)),
        }
    }
}

/// 单个字段的别名定义（按优先级排列,最具体的在前）
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub field: Field,
    pub strict: &'static [Pattern],
    pub loose: &'static [Pattern],
}

/// 一类导入的别名表
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub fields: &'static [FieldAlias],
    pub required: &'static [Field],
    /// 已被占用的列是否禁止分配给其他字段
    pub exclusive: bool,
}

// ==========================================
// ColumnMap - 解析结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    columns: BTreeMap<Field, usize>,
}

impl ColumnMap {
    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// 未解析的必需字段（保持 required 的顺序）
    pub fn missing(&self, required: &[Field]) -> Vec<Field> {
        required
            .iter()
            .copied()
            .filter(|f| !self.contains(*f))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, usize)> + '_ {
        self.columns.iter().map(|(f, c)| (*f, *c))
    }

    fn claimed_columns(&self) -> BTreeSet<usize> {
        self.columns.values().copied().collect()
    }
}

/// 按别名表解析表头
///
/// # 参数
/// - labels: 表头行各列标签（原始文本）
/// - table: 别名表
pub fn resolve_columns<S: AsRef<str>>(labels: &[S], table: &AliasTable) -> ColumnMap {
    let normalized: Vec<String> = labels
        .iter()
        .map(|l| l.as_ref().trim().to_uppercase())
        .collect();

    let mut map = ColumnMap::default();
    let no_claims = BTreeSet::new();

    // 严格轮
    for alias in table.fields {
        let claimed = if table.exclusive {
            map.claimed_columns()
        } else {
            no_claims.clone()
        };
        if let Some(col) = first_match(&normalized, alias.strict, &claimed) {
            map.columns.insert(alias.field, col);
        }
    }

    // 宽松轮: 只排除严格轮的占用
    let strict_claims = if table.exclusive {
        map.claimed_columns()
    } else {
        no_claims
    };
    for alias in table.fields {
        if map.contains(alias.field) {
            continue;
        }
        if let Some(col) = first_match(&normalized, alias.loose, &strict_claims) {
            map.columns.insert(alias.field, col);
        }
    }

    map
}

/// 按模式优先级查找第一个匹配列
fn first_match(
    labels: &[String],
    patterns: &[Pattern],
    claimed: &BTreeSet<usize>,
) -> Option<usize> {
    patterns.iter().find_map(|pattern| {
        labels.iter().enumerate().find_map(|(col, label)| {
            if label.is_empty() || claimed.contains(&col) {
                return None;
            }
            pattern.matches(label).then_some(col)
        })
    })
}

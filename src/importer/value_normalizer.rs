// ==========================================
// SINAPI 预算系统 - 值规范化
// ==========================================
// 策略:
// - 文本: 存在则转字符串并 trim,缺失为空串
// - 标识字段（编码/描述）: 缺失或空白 → 整行跳过（非错误）
// - 金额/系数: 数值原样; 缺失 → 0; 文本按本地化格式解析,
//   解析失败 → 0 并记录 CoercionWarning（不中断批量导入）
// ==========================================

use crate::importer::column_resolver::Field;
use crate::importer::grid::Cell;
use serde::{Deserialize, Serialize};
use tracing::warn;

const CURRENCY_MARKER: &str = "R$";

/// 数值文本格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberStyle {
    /// 金额: "R$ 1.234,56",'.' 恒为千分位,',' 为小数点
    Currency,
    /// 系数: 含 ',' 时同 Currency,否则按点小数解析（"0.025"）
    Decimal,
}

/// 数值回退记录（值已按 0 处理）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionWarning {
    pub row: usize,
    pub field: Field,
    pub raw: String,
}

/// 文本字段
pub fn text(cell: &Cell) -> String {
    cell.as_text().trim().to_string()
}

/// 标识字段: 缺失或空白返回 None
pub fn required_text(cell: &Cell) -> Option<String> {
    let value = text(cell);
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// 解析数值单元格
///
/// # 返回
/// - Some(f64): 数值、缺失（0）或可解析文本
/// - None: 文本无法解析
pub fn parse_number(cell: &Cell, style: NumberStyle) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Empty => Some(0.0),
        Cell::Text(raw) => parse_number_text(raw, style),
    }
}

fn parse_number_text(raw: &str, style: NumberStyle) -> Option<f64> {
    let compact: String = raw
        .replace(CURRENCY_MARKER, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if compact.is_empty() {
        return Some(0.0);
    }

    let localized = match style {
        NumberStyle::Currency => true,
        NumberStyle::Decimal => compact.contains(','),
    };
    let canonical = if localized {
        compact.replace('.', "").replace(',', ".")
    } else {
        compact
    };

    canonical.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 解析数值,失败时回退为 0 并记录警告
pub fn number_or_zero(
    cell: &Cell,
    style: NumberStyle,
    row: usize,
    field: Field,
    warnings: &mut Vec<CoercionWarning>,
) -> f64 {
    match parse_number(cell, style) {
        Some(value) => value,
        None => {
            let raw = cell.as_text();
            warn!(row = row, field = %field, raw = %raw, "数值无法解析,按 0 处理");
            warnings.push(CoercionWarning { row, field, raw });
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency(raw: &str) -> Option<f64> {
        parse_number(&Cell::text(raw), NumberStyle::Currency)
    }

    #[test]
    fn test_currency_brazilian_format() {
        assert_eq!(currency("R$ 1.234,56"), Some(1234.56));
        assert_eq!(currency("0,85"), Some(0.85));
        assert_eq!(currency("R$1.000.000,00"), Some(1_000_000.0));
        assert_eq!(currency(" 12 "), Some(12.0));
    }

    #[test]
    fn test_currency_empty_is_zero() {
        assert_eq!(currency(""), Some(0.0));
        assert_eq!(currency("R$ "), Some(0.0));
        assert_eq!(parse_number(&Cell::Empty, NumberStyle::Currency), Some(0.0));
    }

    #[test]
    fn test_currency_garbage_is_none() {
        assert_eq!(currency("abc"), None);
        assert_eq!(currency("NaN"), None);
        assert_eq!(currency("1,2,3"), None);
    }

    #[test]
    fn test_numeric_cell_passthrough() {
        assert_eq!(parse_number(&Cell::Number(3.5), NumberStyle::Currency), Some(3.5));
        assert_eq!(parse_number(&Cell::Number(0.025), NumberStyle::Decimal), Some(0.025));
    }

    #[test]
    fn test_decimal_style() {
        let decimal = |raw: &str| parse_number(&Cell::text(raw), NumberStyle::Decimal);
        assert_eq!(decimal("0,0250000"), Some(0.025));
        assert_eq!(decimal("0.5"), Some(0.5));
        assert_eq!(decimal("1.234,5"), Some(1234.5));
    }

    #[test]
    fn test_number_or_zero_records_warning() {
        let mut warnings = Vec::new();
        let value = number_or_zero(
            &Cell::text("sob consulta"),
            NumberStyle::Currency,
            7,
            Field::ReferencePrice,
            &mut warnings,
        );
        assert_eq!(value, 0.0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].row, 7);
        assert_eq!(warnings[0].field, Field::ReferencePrice);
        assert_eq!(warnings[0].raw, "sob consulta");

        // 空值回退为 0 但不算警告
        number_or_zero(&Cell::Empty, NumberStyle::Currency, 8, Field::ReferencePrice, &mut warnings);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_text_and_required_text() {
        assert_eq!(text(&Cell::text("  Cimento ")), "Cimento");
        assert_eq!(text(&Cell::Empty), "");
        assert_eq!(text(&Cell::Number(88309.0)), "88309");
        assert_eq!(required_text(&Cell::Empty), None);
        assert_eq!(required_text(&Cell::Text("   ".to_string())), None);
        assert_eq!(required_text(&Cell::text("001")), Some("001".to_string()));
    }
}

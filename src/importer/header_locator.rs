// ==========================================
// SINAPI 预算系统 - 表头定位器
// ==========================================
// 规则: 自上而下扫描,将每行非空单元格大写并以空格连接,
// 第一个满足检测策略的行即为表头行（不回溯）
// ==========================================

use crate::importer::grid::{Cell, CellGrid};

/// 表头检测策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// 行文本包含该关键字
    Keyword(&'static str),
    /// 行文本包含任一关键字
    AnyOf(&'static [&'static str]),
    /// 行文本同时包含全部关键字
    AllOf(&'static [&'static str]),
}

impl HeaderPolicy {
    pub fn matches(&self, row_text: &str) -> bool {
        match self {
            HeaderPolicy::Keyword(k) => row_text.contains(k),
            HeaderPolicy::AnyOf(ks) => ks.iter().any(|k| row_text.contains(k)),
            HeaderPolicy::AllOf(ks) => ks.iter().all(|k| row_text.contains(k)),
        }
    }
}

/// 单元格行的检测文本（大写,非空单元格以空格连接）
pub fn row_signature(row: &[Cell]) -> String {
    row.iter()
        .filter(|c| !c.is_empty())
        .map(|c| c.as_text().to_uppercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 返回第一个匹配行的下标,未找到返回 None
pub fn locate_header(grid: &CellGrid, policy: &HeaderPolicy) -> Option<usize> {
    grid.rows()
        .iter()
        .position(|row| policy.matches(&row_signature(row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_leading_blank_rows() {
        let grid = CellGrid::from_text_rows(vec![
            vec!["", "", ""],
            vec!["", "", ""],
            vec!["CODIGO", "DESCRICAO DO INSUMO", "UNIDADE"],
        ]);
        assert_eq!(locate_header(&grid, &HeaderPolicy::Keyword("CODIGO")), Some(2));
    }

    #[test]
    fn test_ignores_partial_marker_rows() {
        let grid = CellGrid::from_text_rows(vec![
            vec!["SINAPI - COD. REF", "2024"],
            vec!["Relatorio de insumos", ""],
            vec!["Codigo", "Descricao do insumo"],
            vec!["CODIGO", "x"],
        ]);
        // 小写 "Codigo" 经过大写化也算命中
        assert_eq!(locate_header(&grid, &HeaderPolicy::Keyword("CODIGO")), Some(2));
    }

    #[test]
    fn test_any_of_and_all_of() {
        let grid = CellGrid::from_text_rows(vec![
            vec!["CODIGO", "DESCRICAO"],
            vec!["CODIGO DA", "COMPOSICAO", "COEFICIENTE"],
            vec!["CODIGO COMPOSICAO", "COEFICIENTE"],
        ]);

        // 跨单元格拼接也能命中
        let any = HeaderPolicy::AnyOf(&["CODIGO DA COMPOSICAO", "CODIGO COMPOSICAO"]);
        assert_eq!(locate_header(&grid, &any), Some(1));

        let all = HeaderPolicy::AllOf(&["CODIGO", "COEFICIENTE"]);
        assert_eq!(locate_header(&grid, &all), Some(1));
    }

    #[test]
    fn test_not_found() {
        let grid = CellGrid::from_text_rows(vec![vec!["a", "b"], vec!["COD", "ITEM"]]);
        assert_eq!(locate_header(&grid, &HeaderPolicy::Keyword("CODIGO")), None);
        assert_eq!(locate_header(&CellGrid::default(), &HeaderPolicy::Keyword("CODIGO")), None);
    }

    #[test]
    fn test_numeric_cells_participate() {
        let grid = CellGrid::new(vec![vec![Cell::Number(2024.0), Cell::text("CODIGO")]]);
        assert_eq!(row_signature(grid.row(0).unwrap()), "2024 CODIGO");
    }
}

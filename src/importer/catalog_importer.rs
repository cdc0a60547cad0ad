// ==========================================
// SINAPI 预算系统 - 价格目录导入器实现
// ==========================================
// 职责: 整合导入流程,从工作表到数据库
// 流程: 加载 → 表头定位 → 列解析 → 逐行规范化 → 单事务落库
// 中止: 表头未找到 / 必需列缺失 → 零写入,count() == 0
// ==========================================

use crate::db::Store;
use crate::domain::catalog::{CompositeItem, ComponentLink, Item, DEFAULT_SOURCE};
use crate::importer::alias_table::{
    COMPOSITE_ALIASES, COMPOSITE_HEADER_POLICY, ITEM_ALIASES, ITEM_HEADER_POLICY,
};
use crate::importer::column_resolver::{resolve_columns, AliasTable, ColumnMap, Field};
use crate::importer::error::{ImportAbort, ImportResult};
use crate::importer::grid::{Cell, CellGrid};
use crate::importer::grid_loader::UniversalGridLoader;
use crate::importer::header_locator::{locate_header, HeaderPolicy};
use crate::importer::importer_trait::{CatalogImporter, GridLoader};
use crate::importer::report::{ImportKind, ImportReport};
use crate::importer::value_normalizer::{self, NumberStyle};
use crate::repository::CatalogRepository;
use chrono::Local;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const PERIOD_FORMAT: &str = "%Y-%m";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// 当前年月（默认参考期）
pub fn current_period() -> String {
    Local::now().format(PERIOD_FORMAT).to_string()
}

// ==========================================
// CatalogImporterImpl - 价格目录导入器
// ==========================================
pub struct CatalogImporterImpl {
    // 数据访问层
    catalog: CatalogRepository,

    // 网格加载器
    loader: Box<dyn GridLoader>,

    // 来源标记
    source: String,
}

impl CatalogImporterImpl {
    /// 创建导入器
    ///
    /// # 参数
    /// - catalog: 目录仓储
    /// - loader: 网格加载器
    /// - source: 写入记录的来源标记
    pub fn new(
        catalog: CatalogRepository,
        loader: Box<dyn GridLoader>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            loader,
            source: source.into(),
        }
    }

    /// 基于存储句柄创建（按扩展名选择加载器,来源 SINAPI）
    pub fn with_store(store: &Store) -> Self {
        Self::new(
            store.catalog(),
            Box::new(UniversalGridLoader),
            DEFAULT_SOURCE,
        )
    }

    /// 从内存网格导入条目（跳过加载阶段）
    #[instrument(skip(self, grid), fields(rows = grid.len()))]
    pub fn import_items_from_grid(
        &self,
        grid: &CellGrid,
        sheet: &str,
        reference_period: Option<&str>,
    ) -> ImportResult<ImportReport> {
        let period = resolve_period(reference_period);
        let mut report = ImportReport::new(new_batch_id(), ImportKind::Items, sheet, &period);
        info!(batch_id = %report.batch_id, sheet = %sheet, period = %period, "开始导入条目");

        // === 阶段 1-2: 表头定位 + 列解析 ===
        let Some((header_row, columns)) =
            Self::prepare(grid, sheet, &ITEM_HEADER_POLICY, &ITEM_ALIASES, &mut report)
        else {
            return Ok(report);
        };

        // === 阶段 3: 逐行规范化 ===
        let updated_on = today();
        let mut items = Vec::new();
        for (row_idx, row) in grid.rows().iter().enumerate().skip(header_row + 1) {
            let cell = |field: Field| column_cell(row, &columns, field);

            let (Some(code), Some(description)) = (
                value_normalizer::required_text(cell(Field::Code)),
                value_normalizer::required_text(cell(Field::Description)),
            ) else {
                debug!(row = row_idx, "缺少编码或描述,跳过");
                report.skipped_rows += 1;
                continue;
            };

            let reference_price = value_normalizer::number_or_zero(
                cell(Field::ReferencePrice),
                NumberStyle::Currency,
                row_idx,
                Field::ReferencePrice,
                &mut report.warnings,
            );

            items.push(Item {
                code,
                description,
                unit: value_normalizer::text(cell(Field::Unit)),
                reference_price,
                source: self.source.clone(),
                reference_period: period.clone(),
                updated_on: updated_on.clone(),
            });
        }

        // === 阶段 4: 落库 ===
        report.records = self.catalog.write_items(&items)?;

        info!(
            batch_id = %report.batch_id,
            records = report.records,
            skipped = report.skipped_rows,
            warnings = report.warnings.len(),
            "条目导入完成"
        );
        Ok(report)
    }

    /// 从内存网格导入组合（跳过加载阶段）
    #[instrument(skip(self, grid), fields(rows = grid.len()))]
    pub fn import_composites_from_grid(
        &self,
        grid: &CellGrid,
        sheet: &str,
        reference_period: Option<&str>,
    ) -> ImportResult<ImportReport> {
        let period = resolve_period(reference_period);
        let mut report =
            ImportReport::new(new_batch_id(), ImportKind::Composites, sheet, &period);
        info!(batch_id = %report.batch_id, sheet = %sheet, period = %period, "开始导入组合");

        let Some((header_row, columns)) = Self::prepare(
            grid,
            sheet,
            &COMPOSITE_HEADER_POLICY,
            &COMPOSITE_ALIASES,
            &mut report,
        ) else {
            return Ok(report);
        };

        let updated_on = today();
        let mut seen: HashSet<String> = HashSet::new();
        let mut composites = Vec::new();
        let mut links = Vec::new();

        for (row_idx, row) in grid.rows().iter().enumerate().skip(header_row + 1) {
            let cell = |field: Field| column_cell(row, &columns, field);

            let Some(composite_code) =
                value_normalizer::required_text(cell(Field::CompositeCode))
            else {
                debug!(row = row_idx, "缺少组合编码,跳过");
                report.skipped_rows += 1;
                continue;
            };

            // 组合表头在本次调用内只写一次
            if seen.insert(composite_code.clone()) {
                let total_cost = value_normalizer::number_or_zero(
                    cell(Field::TotalCost),
                    NumberStyle::Currency,
                    row_idx,
                    Field::TotalCost,
                    &mut report.warnings,
                );
                composites.push(CompositeItem {
                    code: composite_code.clone(),
                    description: value_normalizer::text(cell(Field::CompositeDescription)),
                    unit: value_normalizer::text(cell(Field::CompositeUnit)),
                    total_cost,
                    source: self.source.clone(),
                    reference_period: period.clone(),
                    updated_on: updated_on.clone(),
                });
            }

            // 每个非空组件编码写一条关系（不去重）
            if let Some(component_code) =
                value_normalizer::required_text(cell(Field::ComponentCode))
            {
                let coefficient = value_normalizer::number_or_zero(
                    cell(Field::Coefficient),
                    NumberStyle::Decimal,
                    row_idx,
                    Field::Coefficient,
                    &mut report.warnings,
                );
                links.push(ComponentLink {
                    composite_code,
                    component_code,
                    coefficient,
                });
            }
        }

        let (records, link_count) = self.catalog.write_composites(&composites, &links)?;
        report.records = records;
        report.links = link_count;

        info!(
            batch_id = %report.batch_id,
            composites = report.records,
            links = report.links,
            skipped = report.skipped_rows,
            warnings = report.warnings.len(),
            "组合导入完成"
        );
        Ok(report)
    }

    /// 表头定位 + 列解析; 失败时在报告中记录中止原因并返回 None
    fn prepare(
        grid: &CellGrid,
        sheet: &str,
        policy: &HeaderPolicy,
        aliases: &AliasTable,
        report: &mut ImportReport,
    ) -> Option<(usize, ColumnMap)> {
        let Some(header_row) = locate_header(grid, policy) else {
            let abort = ImportAbort::HeaderNotFound {
                sheet: sheet.to_string(),
            };
            warn!(batch_id = %report.batch_id, reason = %abort, "导入中止");
            report.abort = Some(abort);
            return None;
        };
        report.header_row = Some(header_row);

        let labels: Vec<String> = grid
            .row(header_row)
            .unwrap_or_default()
            .iter()
            .map(Cell::as_text)
            .collect();
        let columns = resolve_columns(&labels, aliases);
        debug!(header_row = header_row, resolved = columns.len(), "列解析完成");

        let missing = columns.missing(aliases.required);
        if !missing.is_empty() {
            let abort = ImportAbort::RequiredColumnsMissing {
                sheet: sheet.to_string(),
                missing,
            };
            warn!(batch_id = %report.batch_id, reason = %abort, "导入中止");
            report.abort = Some(abort);
            return None;
        }

        Some((header_row, columns))
    }
}

impl CatalogImporter for CatalogImporterImpl {
    fn import_items(
        &self,
        file_path: &Path,
        sheet: &str,
        reference_period: Option<&str>,
    ) -> ImportResult<ImportReport> {
        let grid = self.loader.load_grid(file_path, sheet)?;
        info!(file = %file_path.display(), rows = grid.len(), "网格加载完成");
        self.import_items_from_grid(&grid, sheet, reference_period)
    }

    fn import_composites(
        &self,
        file_path: &Path,
        sheet: &str,
        reference_period: Option<&str>,
    ) -> ImportResult<ImportReport> {
        let grid = self.loader.load_grid(file_path, sheet)?;
        info!(file = %file_path.display(), rows = grid.len(), "网格加载完成");
        self.import_composites_from_grid(&grid, sheet, reference_period)
    }
}

// ==========================================
// 辅助函数
// ==========================================

static MISSING: Cell = Cell::Empty;

/// 取字段对应列的单元格; 列未解析或行过短时视为空
fn column_cell<'a>(row: &'a [Cell], columns: &ColumnMap, field: Field) -> &'a Cell {
    columns
        .get(field)
        .and_then(|col| row.get(col))
        .unwrap_or(&MISSING)
}

fn resolve_period(reference_period: Option<&str>) -> String {
    match reference_period.map(str::trim) {
        Some(period) if !period.is_empty() => period.to_string(),
        _ => current_period(),
    }
}

fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

fn new_batch_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportError;

    fn importer(store: &Store) -> CatalogImporterImpl {
        CatalogImporterImpl::with_store(store)
    }

    #[test]
    fn test_items_end_to_end_grid() {
        let store = Store::open_in_memory().unwrap();
        let grid = CellGrid::from_text_rows(vec![
            vec!["", "", ""],
            vec!["CODIGO", "DESCRICAO DO INSUMO", "UNIDADE", "PRECO MEDIANO"],
            vec!["001", "Cimento", "kg", "0,85"],
            vec!["002", "", "kg", "1,00"],
        ]);

        let report = importer(&store)
            .import_items_from_grid(&grid, "insumos", Some("2024-03"))
            .unwrap();

        assert_eq!(report.header_row, Some(1));
        assert_eq!(report.count(), 1);
        assert_eq!(report.skipped_rows, 1);
        assert!(report.warnings.is_empty());

        let item = store.catalog().find_item("001").unwrap().unwrap();
        assert_eq!(item.description, "Cimento");
        assert_eq!(item.unit, "kg");
        assert!((item.reference_price - 0.85).abs() < 1e-9);
        assert_eq!(item.source, "SINAPI");
        assert_eq!(item.reference_period, "2024-03");
        assert!(store.catalog().find_item("002").unwrap().is_none());
    }

    #[test]
    fn test_items_numeric_cells_and_garbage_price() {
        let store = Store::open_in_memory().unwrap();
        let grid = CellGrid::new(vec![
            vec![
                Cell::from("CODIGO"),
                Cell::from("DESCRICAO DO INSUMO"),
                Cell::from("UNIDADE"),
                Cell::from("PRECO MEDIANO R$"),
            ],
            vec![
                Cell::from(88309.0),
                Cell::from("PEDREIRO"),
                Cell::from("H"),
                Cell::from(23.47),
            ],
            vec![
                Cell::from(370.0),
                Cell::from("AREIA MEDIA"),
                Cell::from("M3"),
                Cell::from("sob consulta"),
            ],
        ]);

        let report = importer(&store)
            .import_items_from_grid(&grid, "insumos", None)
            .unwrap();

        assert_eq!(report.count(), 2);
        assert_eq!(report.reference_period, current_period());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].row, 2);
        assert_eq!(report.warnings[0].field, Field::ReferencePrice);

        let item = store.catalog().find_item("88309").unwrap().unwrap();
        assert_eq!(item.reference_price, 23.47);
        let garbage = store.catalog().find_item("370").unwrap().unwrap();
        assert_eq!(garbage.reference_price, 0.0);
    }

    #[test]
    fn test_items_loose_header_with_shared_price_column() {
        let store = Store::open_in_memory().unwrap();
        let grid = CellGrid::from_text_rows(vec![
            vec!["CODIGO", "DESCRICAO", "PRECO UNITARIO", "UN"],
            vec!["001", "Cimento", "0,85", "kg"],
        ]);

        let report = importer(&store)
            .import_items_from_grid(&grid, "insumos", Some("2024-03"))
            .unwrap();

        assert!(report.abort.is_none());
        assert_eq!(report.count(), 1);
        let item = store.catalog().find_item("001").unwrap().unwrap();
        assert_eq!(item.description, "Cimento");
        assert!((item.reference_price - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_items_header_not_found_aborts() {
        let store = Store::open_in_memory().unwrap();
        let grid = CellGrid::from_text_rows(vec![vec!["Relatório"], vec!["001", "Cimento"]]);

        let report = importer(&store)
            .import_items_from_grid(&grid, "insumos", None)
            .unwrap();

        assert!(report.is_aborted());
        assert_eq!(report.count(), 0);
        assert!(matches!(report.abort, Some(ImportAbort::HeaderNotFound { .. })));
        assert_eq!(store.catalog().count_items().unwrap(), 0);
    }

    #[test]
    fn test_composites_dedup_within_call() {
        let store = Store::open_in_memory().unwrap();
        let mut rows = vec![vec![
            "CODIGO DA COMPOSICAO",
            "DESCRICAO DA COMPOSICAO",
            "UNIDADE",
            "CUSTO TOTAL",
            "CODIGO ITEM",
            "COEFICIENTE",
        ]];
        let components = ["A1", "A2", "A3", "A4", "A5"];
        for component in components {
            rows.push(vec!["87292", "ARGAMASSA", "M3", "R$ 512,30", component, "0,5"]);
        }
        let grid = CellGrid::from_text_rows(rows);

        let report = importer(&store)
            .import_composites_from_grid(&grid, "Composicoes", Some("2024-03"))
            .unwrap();

        assert_eq!(report.count(), 1);
        assert_eq!(report.links, 5);
        assert_eq!(store.catalog().count_composites().unwrap(), 1);
        assert_eq!(store.catalog().count_links().unwrap(), 5);

        let composite = store.catalog().find_composite("87292").unwrap().unwrap();
        assert_eq!(composite.description, "ARGAMASSA");
        assert!((composite.total_cost - 512.30).abs() < 1e-9);

        let details = store.catalog().list_components("87292").unwrap();
        assert_eq!(details.len(), 5);
        assert!(details.iter().all(|d| d.coefficient == 0.5));
    }

    #[test]
    fn test_composites_blank_code_rows_skipped_and_dot_coefficients() {
        let store = Store::open_in_memory().unwrap();
        let grid = CellGrid::from_text_rows(vec![
            vec!["CODIGO COMPOSICAO", "CODIGO DO ITEM", "COEF"],
            vec!["100", "X1", "0.025"],
            vec!["", "X2", "1"],
            vec!["100", "", "2"],
            vec!["101", "X3", "1.234,5"],
        ]);

        let report = importer(&store)
            .import_composites_from_grid(&grid, "Composicoes", None)
            .unwrap();

        assert_eq!(report.count(), 2);
        assert_eq!(report.links, 2);
        assert_eq!(report.skipped_rows, 1);

        let first = store.catalog().list_components("100").unwrap();
        assert_eq!(first.len(), 1);
        assert!((first[0].coefficient - 0.025).abs() < 1e-12);
        let second = store.catalog().list_components("101").unwrap();
        assert!((second[0].coefficient - 1234.5).abs() < 1e-9);
    }

    #[test]
    fn test_composites_missing_coefficient_aborts_without_writes() {
        let store = Store::open_in_memory().unwrap();
        let grid = CellGrid::from_text_rows(vec![
            vec!["CODIGO DA COMPOSICAO", "DESCRICAO", "CODIGO ITEM"],
            vec!["87292", "ARGAMASSA", "A1"],
        ]);

        let report = importer(&store)
            .import_composites_from_grid(&grid, "Composicoes", None)
            .unwrap();

        assert_eq!(report.count(), 0);
        match report.abort {
            Some(ImportAbort::RequiredColumnsMissing { missing, .. }) => {
                assert_eq!(missing, vec![Field::Coefficient]);
            }
            other => panic!("unexpected abort: {:?}", other),
        }
        assert_eq!(store.catalog().count_composites().unwrap(), 0);
        assert_eq!(store.catalog().count_links().unwrap(), 0);
    }

    #[test]
    fn test_missing_file_is_error() {
        let store = Store::open_in_memory().unwrap();
        let result = importer(&store).import_items(Path::new("/nao/existe.xlsx"), "insumos", None);
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}

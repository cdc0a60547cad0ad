// ==========================================
// SINAPI 预算系统 - 导入API
// ==========================================
// 职责: 封装目录导入,按工作表名猜测顺序重试
// 重试条件: 工作表不存在 / 导入中止（表头或必需列）
// 不重试: 文件错误、落库错误（直接返回）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportSettings;
use crate::db::Store;
use crate::importer::{
    CatalogImporter, CatalogImporterImpl, ImportError, ImportKind, ImportReport,
    UniversalGridLoader,
};
use std::path::Path;
use tracing::{info, warn};

pub struct ImportApi {
    importer: CatalogImporterImpl,
    settings: ImportSettings,
}

impl ImportApi {
    /// 基于存储句柄与导入设置创建
    pub fn new(store: &Store, settings: ImportSettings) -> Self {
        let importer = CatalogImporterImpl::new(
            store.catalog(),
            Box::new(UniversalGridLoader),
            settings.source_tag.clone(),
        );
        Self { importer, settings }
    }

    /// 使用自定义导入器（自定义加载器）
    pub fn with_importer(importer: CatalogImporterImpl, settings: ImportSettings) -> Self {
        Self { importer, settings }
    }

    /// 导入条目,依次尝试 item_sheets
    pub fn import_items(&self, file: &Path, period: Option<&str>) -> ApiResult<ImportReport> {
        self.import_with_fallback(ImportKind::Items, &self.settings.item_sheets, file, period)
    }

    /// 导入组合,依次尝试 composite_sheets
    pub fn import_composites(&self, file: &Path, period: Option<&str>) -> ApiResult<ImportReport> {
        self.import_with_fallback(
            ImportKind::Composites,
            &self.settings.composite_sheets,
            file,
            period,
        )
    }

    /// 指定工作表导入（不做重试）
    pub fn import_sheet(
        &self,
        kind: ImportKind,
        file: &Path,
        sheet: &str,
        period: Option<&str>,
    ) -> ApiResult<ImportReport> {
        let report = match kind {
            ImportKind::Items => self.importer.import_items(file, sheet, period)?,
            ImportKind::Composites => self.importer.import_composites(file, sheet, period)?,
        };
        Ok(report)
    }

    fn import_with_fallback(
        &self,
        kind: ImportKind,
        sheets: &[String],
        file: &Path,
        period: Option<&str>,
    ) -> ApiResult<ImportReport> {
        let mut last_report: Option<ImportReport> = None;
        let mut last_missing: Option<ImportError> = None;

        for sheet in sheets {
            let result = match kind {
                ImportKind::Items => self.importer.import_items(file, sheet, period),
                ImportKind::Composites => self.importer.import_composites(file, sheet, period),
            };

            match result {
                Ok(report) if !report.is_aborted() => {
                    info!(kind = %kind, sheet = %sheet, count = report.count(), "导入成功");
                    return Ok(report);
                }
                Ok(report) => {
                    warn!(kind = %kind, sheet = %sheet, "导入中止,尝试下一个工作表名");
                    last_report = Some(report);
                }
                Err(err @ ImportError::SheetNotFound { .. }) => {
                    warn!(kind = %kind, sheet = %sheet, "工作表不存在,尝试下一个工作表名");
                    last_missing = Some(err);
                }
                Err(err) => return Err(err.into()),
            }
        }

        match (last_report, last_missing) {
            (Some(report), _) => Ok(report),
            (None, Some(err)) => Err(err.into()),
            (None, None) => Err(ApiError::InvalidInput(format!(
                "未配置 {} 的工作表名",
                kind
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::{CellGrid, GridLoader, ImportResult};

    /// 只认识一个工作表名的内存加载器
    struct SingleSheetLoader {
        sheet: &'static str,
        grid: CellGrid,
    }

    impl GridLoader for SingleSheetLoader {
        fn load_grid(&self, _file_path: &Path, sheet: &str) -> ImportResult<CellGrid> {
            if sheet == self.sheet {
                Ok(self.grid.clone())
            } else {
                Err(ImportError::SheetNotFound {
                    sheet: sheet.to_string(),
                    available: vec![self.sheet.to_string()],
                })
            }
        }
    }

    fn api_with(store: &Store, sheet: &'static str, grid: CellGrid) -> ImportApi {
        let importer = CatalogImporterImpl::new(
            store.catalog(),
            Box::new(SingleSheetLoader { sheet, grid }),
            "SINAPI",
        );
        ImportApi::with_importer(importer, ImportSettings::default())
    }

    fn items_grid() -> CellGrid {
        CellGrid::from_text_rows(vec![
            vec!["CODIGO", "DESCRICAO DO INSUMO", "UNIDADE", "PRECO MEDIANO"],
            vec!["001", "Cimento", "kg", "0,85"],
        ])
    }

    #[test]
    fn test_fallback_picks_second_sheet_guess() {
        let store = Store::open_in_memory().unwrap();
        let api = api_with(&store, "Insumos", items_grid());

        let report = api.import_items(Path::new("sinapi.xlsx"), Some("2024-01")).unwrap();
        assert_eq!(report.sheet, "Insumos");
        assert_eq!(report.count(), 1);
    }

    #[test]
    fn test_all_sheets_missing_returns_sheet_not_found() {
        let store = Store::open_in_memory().unwrap();
        let api = api_with(&store, "Outra", items_grid());

        let result = api.import_composites(Path::new("sinapi.xlsx"), None);
        assert!(matches!(
            result,
            Err(ApiError::Import(ImportError::SheetNotFound { ref sheet, .. })) if sheet == "composicoes"
        ));
    }

    #[test]
    fn test_aborted_report_is_returned_after_all_guesses() {
        let store = Store::open_in_memory().unwrap();
        let api = api_with(&store, "insumos", CellGrid::from_text_rows(vec![vec!["sem", "tabela"]]));

        let report = api.import_items(Path::new("sinapi.xlsx"), None).unwrap();
        assert!(report.is_aborted());
        assert_eq!(report.sheet, "insumos");
        assert_eq!(report.count(), 0);
    }
}

// ==========================================
// SINAPI 预算系统 - 导入层
// ==========================================
// 职责: 将 SINAPI 工作表导入价格目录
// 流程: 网格加载 → 表头定位 → 列解析 → 值规范化 → 单事务落库
// 支持: Excel (xlsx/xlsm/xlsb/xls/ods), CSV
// ==========================================

// 模块声明
pub mod alias_table;
pub mod catalog_importer;
pub mod column_resolver;
pub mod error;
pub mod grid;
pub mod grid_loader;
pub mod header_locator;
pub mod importer_trait;
pub mod report;
pub mod value_normalizer;

// 重导出核心类型
pub use catalog_importer::CatalogImporterImpl;
pub use column_resolver::{resolve_columns, AliasTable, ColumnMap, Field, FieldAlias, Pattern};
pub use error::{ImportAbort, ImportError, ImportResult};
pub use grid::{Cell, CellGrid};
pub use grid_loader::{CsvGridLoader, ExcelGridLoader, UniversalGridLoader};
pub use header_locator::{locate_header, HeaderPolicy};
pub use report::{ImportKind, ImportReport};
pub use value_normalizer::{CoercionWarning, NumberStyle};

// 重导出 Trait 接口
pub use importer_trait::{CatalogImporter, GridLoader};

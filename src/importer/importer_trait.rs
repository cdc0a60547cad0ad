// ==========================================
// SINAPI 预算系统 - 导入接口 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::grid::CellGrid;
use crate::importer::report::ImportReport;
use std::path::Path;

// ==========================================
// CatalogImporter Trait
// ==========================================
// 用途: 价格目录导入主接口
// 实现者: CatalogImporterImpl
pub trait CatalogImporter {
    /// 导入单价条目表（insumos）
    ///
    /// # 参数
    /// - file_path: 工作簿路径
    /// - sheet: 工作表名
    /// - reference_period: 参考期（YYYY-MM）,None 时取当前年月
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入报告（中止时 count() == 0）
    /// - Err: 文件读取错误、工作表不存在、落库错误
    ///
    /// # 导入流程
    /// 1. 加载网格
    /// 2. 表头定位
    /// 3. 列解析 + 必需列校验
    /// 4. 逐行规范化
    /// 5. 单事务落库
    fn import_items(
        &self,
        file_path: &Path,
        sheet: &str,
        reference_period: Option<&str>,
    ) -> ImportResult<ImportReport>;

    /// 导入组合表（composições）
    ///
    /// # 说明
    /// - 同一组合编码在一次调用内只写入一次
    /// - 每个组件编码非空的明细行写入一条组件关系
    fn import_composites(
        &self,
        file_path: &Path,
        sheet: &str,
        reference_period: Option<&str>,
    ) -> ImportResult<ImportReport>;
}

// ==========================================
// GridLoader Trait
// ==========================================
// 用途: 网格加载接口（阶段 0）
// 实现者: ExcelGridLoader, CsvGridLoader, UniversalGridLoader
pub trait GridLoader {
    /// 读取工作表为无类型网格（不假设表头）
    ///
    /// # 返回
    /// - Ok(CellGrid): 网格
    /// - Err: 文件不存在、格式不支持、工作表不存在
    fn load_grid(&self, file_path: &Path, sheet: &str) -> ImportResult<CellGrid>;
}

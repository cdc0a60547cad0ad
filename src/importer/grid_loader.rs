// ==========================================
// SINAPI 预算系统 - 网格加载器实现
// ==========================================
// 职责: 读取指定工作表为无类型网格（不假设表头）
// 支持: Excel (.xlsx/.xlsm/.xlsb/.xls/.ods) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::grid::{Cell, CellGrid};
use crate::importer::importer_trait::GridLoader;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// CSV Loader 实现
// ==========================================
// CSV 只有一张"表",sheet 参数被忽略
pub struct CsvGridLoader;

impl GridLoader for CsvGridLoader {
    fn load_grid(&self, file_path: &Path, sheet: &str) -> ImportResult<CellGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }
        debug!(file = %file_path.display(), sheet = %sheet, "CSV 无工作表概念,忽略 sheet 参数");

        let bytes = fs::read(file_path)?;
        let delimiter = detect_delimiter(&String::from_utf8_lossy(&bytes));
        debug!(delimiter = %char::from(delimiter), "CSV 分隔符");

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false) // 表头位置由 HeaderLocator 决定
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes.as_slice());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(Cell::text).collect());
        }

        Ok(CellGrid::new(rows))
    }
}

/// 候选分隔符,出现次数相同时靠前者优先
const DELIMITER_CANDIDATES: [u8; 3] = [b';', b',', b'\t'];

/// 取第一条既有内容又含候选分隔符的行猜测分隔符,找不到时默认 ','
fn detect_delimiter(content: &str) -> u8 {
    let Some(line) = content.lines().find(|line| {
        line.chars().any(char::is_alphanumeric)
            && line.bytes().any(|b| DELIMITER_CANDIDATES.contains(&b))
    }) else {
        return b',';
    };

    let mut best = (b',', 0);
    for candidate in DELIMITER_CANDIDATES {
        let count = line.bytes().filter(|b| *b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

// ==========================================
// Excel Loader 实现
// ==========================================
pub struct ExcelGridLoader;

impl GridLoader for ExcelGridLoader {
    fn load_grid(&self, file_path: &Path, sheet: &str) -> ImportResult<CellGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_names = workbook.sheet_names();
        if !sheet_names.iter().any(|name| name == sheet) {
            return Err(ImportError::SheetNotFound {
                sheet: sheet.to_string(),
                available: sheet_names,
            });
        }

        let range = workbook.worksheet_range(sheet)?;

        // calamine 的 Range 从第一个非空单元格开始,补齐前导空行/空列,
        // 保证网格坐标与工作表坐标一致
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
        for data_row in range.rows() {
            let mut row = vec![Cell::Empty; col_offset];
            row.extend(data_row.iter().map(Cell::from));
            rows.push(row);
        }

        debug!(sheet = %sheet, rows = rows.len(), "工作表读取完成");
        Ok(CellGrid::new(rows))
    }
}

// ==========================================
// 通用加载器（根据扩展名自动选择）
// ==========================================
pub struct UniversalGridLoader;

impl GridLoader for UniversalGridLoader {
    fn load_grid(&self, file_path: &Path, sheet: &str) -> ImportResult<CellGrid> {
        let ext = extension_of(file_path);

        match ext.as_str() {
            "csv" => CsvGridLoader.load_grid(file_path, sheet),
            e if EXCEL_EXTENSIONS.contains(&e) => ExcelGridLoader.load_grid(file_path, sheet),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_loader_keeps_leading_rows() {
        let temp_file = csv_file(&[
            ",,",
            "CODIGO,DESCRICAO DO INSUMO,UNIDADE",
            "001,Cimento,kg",
        ]);

        let grid = CsvGridLoader.load_grid(temp_file.path(), "insumos").unwrap();

        assert_eq!(grid.len(), 3);
        assert!(grid.row(0).unwrap().iter().all(Cell::is_empty));
        assert_eq!(grid.cell(1, 0), &Cell::Text("CODIGO".to_string()));
        assert_eq!(grid.cell(2, 1), &Cell::Text("Cimento".to_string()));
    }

    #[test]
    fn test_csv_loader_flexible_rows() {
        let temp_file = csv_file(&["a,b,c", "d"]);
        let grid = CsvGridLoader.load_grid(temp_file.path(), "").unwrap();
        assert_eq!(grid.row(1).unwrap().len(), 1);
        assert_eq!(grid.cell(1, 2), &Cell::Empty);
    }

    #[test]
    fn test_csv_loader_semicolon_file() {
        let temp_file = csv_file(&[
            ";;;",
            "CODIGO;DESCRICAO DO INSUMO;UNIDADE;PRECO MEDIANO",
            "001;Cimento;kg;0,85",
        ]);

        let grid = CsvGridLoader.load_grid(temp_file.path(), "insumos").unwrap();

        assert_eq!(grid.len(), 3);
        assert_eq!(grid.row(1).unwrap().len(), 4);
        assert_eq!(grid.cell(2, 3), &Cell::Text("0,85".to_string()));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2,5;3"), b';');
        assert_eq!(detect_delimiter(",,\nCODIGO,DESCRICAO\n"), b',');
        assert_eq!(detect_delimiter("CODIGO\tUNIDADE\n"), b'\t');
        assert_eq!(detect_delimiter("TITULO\nCODIGO;UNIDADE\n"), b';');
        assert_eq!(detect_delimiter("CODIGO\n"), b',');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn test_loader_file_not_found() {
        let result = UniversalGridLoader.load_grid(Path::new("non_existent.xlsx"), "insumos");
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_loader_unsupported_format() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalGridLoader.load_grid(temp_file.path(), "insumos");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_excel_loader_rejects_garbage_file() {
        let mut temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        writeln!(temp_file, "not a zip archive").unwrap();
        let result = ExcelGridLoader.load_grid(temp_file.path(), "insumos");
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }
}

// ==========================================
// SIV-SITE 装配线 BOM 导入 - 文件解析器实现
// ==========================================
// 职责: 工作簿 / CSV → Grid（原始单元格，不做表头假设）
// 支持: Excel (.xlsx/.xlsm/.xls/.ods) / CSV (.csv)
// ==========================================

use crate::domain::cell::{CellValue, Grid};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::item_importer_trait::FileParser;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// 支持的工作簿扩展名
pub const EXCEL_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 小写扩展名（无扩展名返回空串）
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
// 无表头假设；允许行长度不一致；完整数值文本 → Number
pub struct CsvParser;

impl CsvParser {
    fn read_grid<R: Read>(&self, reader: R) -> ImportResult<Grid> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(csv_cell).collect());
        }

        Ok(Grid::new(rows))
    }
}

fn csv_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(raw.to_string()),
    }
}

impl FileParser for CsvParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<Grid> {
        ensure_exists(file_path)?;

        let ext = file_extension(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let bytes = std::fs::read(file_path)?;
        self.parse_bytes(&bytes)
    }

    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Grid> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        self.read_grid(bytes)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// sheet_name 为 None 时读取第一个工作表
#[derive(Debug, Clone, Default)]
pub struct ExcelParser {
    sheet_name: Option<String>,
}

impl ExcelParser {
    pub fn new(sheet_name: Option<String>) -> Self {
        Self { sheet_name }
    }

    fn read_sheet<RS: Read + Seek>(&self, workbook: &mut Sheets<RS>) -> ImportResult<Grid> {
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError("工作簿无工作表".to_string()));
        }

        let sheet_name = match &self.sheet_name {
            Some(wanted) => sheet_names
                .iter()
                .find(|name| name.trim().eq_ignore_ascii_case(wanted.trim()))
                .cloned()
                .ok_or_else(|| ImportError::SheetNotFound(wanted.clone()))?,
            None => sheet_names[0].clone(),
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        Ok(range_to_grid(&range))
    }
}

impl FileParser for ExcelParser {
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<Grid> {
        ensure_exists(file_path)?;

        let ext = file_extension(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        self.read_sheet(&mut workbook)
    }

    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Grid> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        self.read_sheet(&mut workbook)
    }
}

/// Range 从 start() 开始；补齐前导空行/空列，保证行号与工作表一致
fn range_to_grid(range: &Range<Data>) -> Grid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; col_offset];
        cells.extend(row.iter().map(excel_cell));
        rows.push(cells);
    }

    Grid::new(rows)
}

fn excel_cell(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

/// 带时间部分的序列号 → 日期时间（精确到毫秒，不取整到天）
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct UniversalFileParser {
    sheet_name: Option<String>,
}

impl UniversalFileParser {
    pub fn new(sheet_name: Option<String>) -> Self {
        Self { sheet_name }
    }

    fn select(&self, ext: &str) -> ImportResult<Box<dyn FileParser>> {
        match ext {
            "csv" => Ok(Box::new(CsvParser)),
            e if EXCEL_EXTENSIONS.contains(&e) => {
                Ok(Box::new(ExcelParser::new(self.sheet_name.clone())))
            }
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Grid> {
        let path = file_path.as_ref();
        ensure_exists(path)?;
        self.select(&file_extension(path))?.parse_to_grid(path)
    }

    /// 按文件名扩展名解析内存内容
    pub fn parse_named_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Grid> {
        self.select(&file_extension(Path::new(file_name)))?
            .parse_bytes(bytes)
    }
}

// ==========================================
// SIV-SITE 装配线 BOM 导入 - 单元格与表格模型
// ==========================================
// 职责: 描述工作表原始数据（Grid = 行 × 单元格）
// 红线: 单元格类型显式建模，不做运行时类型猜测
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 单元格值
// ==========================================
// 四种形态: 文本 / 数值（含日期序列号） / 日期 / 空
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    #[default]
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// 仅文本单元格返回内容
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// "假值"判定：空、空白文本、数值 0
    pub fn is_falsy(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => *n == 0.0 || n.is_nan(),
            CellValue::Date(_) => false,
        }
    }

    /// 噪声判定：空白 / 0 / "0" / "0%"
    pub fn is_blank_or_zero(&self) -> bool {
        match self {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || trimmed == "0" || trimmed == "0%"
            }
            other => other.is_falsy(),
        }
    }

    /// 单元格的展示文本（已 TRIM）
    ///
    /// 整数值不带小数点（101.0 → "101"），日期为 ISO 格式，空单元格为空串。
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Date(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.date().format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            CellValue::Empty => String::new(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ==========================================
// Grid - 工作表原始数据
// ==========================================
// 生命周期: 由文件解析器产出一次，解析过程中只读
// 行宽不固定（允许短行）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// 越界（短行）返回 None
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Vec<CellValue>>> for Grid {
    fn from(rows: Vec<Vec<CellValue>>) -> Self {
        Self::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falsy_cells() {
        assert!(CellValue::Empty.is_falsy());
        assert!(CellValue::text("   ").is_falsy());
        assert!(CellValue::Number(0.0).is_falsy());
        assert!(!CellValue::text("0").is_falsy());
        assert!(!CellValue::Number(3.0).is_falsy());
    }

    #[test]
    fn test_blank_or_zero() {
        assert!(CellValue::text("0").is_blank_or_zero());
        assert!(CellValue::text(" 0% ").is_blank_or_zero());
        assert!(CellValue::Number(0.0).is_blank_or_zero());
        assert!(!CellValue::text("0.5").is_blank_or_zero());
        assert!(!CellValue::text("ACME").is_blank_or_zero());
    }

    #[test]
    fn test_display_text_integral_number() {
        assert_eq!(CellValue::Number(101.0).display_text(), "101");
        assert_eq!(CellValue::Number(2.5).display_text(), "2.5");
        assert_eq!(CellValue::text("  OP10 ").display_text(), "OP10");
    }

    #[test]
    fn test_grid_short_rows() {
        let grid = Grid::new(vec![vec!["ID".into(), "Cliente".into()], vec!["A1".into()]]);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell(1, 0), Some(&CellValue::text("A1")));
        assert_eq!(grid.cell(1, 1), None);
    }
}

// ==========================================
// SIV-SITE 装配线 BOM 导入 - 数据清洗器实现
// ==========================================
// 职责: TRIM / UPPER / NULL 标准化 / 单元格 → 数值、日期、文本
// 红线: 任何单元格都不会导致报错，一律回退默认值
// ==========================================

use crate::domain::cell::CellValue;
use crate::importer::item_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// 表格日期纪元（序列号 0）
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// 1970-01-01 对应的序列号
pub const UNIX_EPOCH_SERIAL: f64 = 25569.0;

/// 序列号上限（9999-12-31）
const MAX_SERIAL: f64 = 2_958_465.0;

/// 文本日期的可接受格式（依次尝试）
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn coerce_text(&self, cell: Option<&CellValue>) -> Option<String> {
        self.normalize_null(cell.map(CellValue::display_text))
    }

    fn coerce_f64(&self, cell: Option<&CellValue>) -> f64 {
        let value = match cell {
            Some(CellValue::Number(n)) => *n,
            Some(CellValue::Text(s)) => parse_float_prefix(s).unwrap_or(0.0),
            Some(CellValue::Date(_)) | Some(CellValue::Empty) | None => 0.0,
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    fn coerce_date(&self, cell: Option<&CellValue>) -> Option<NaiveDate> {
        let cell = cell?;
        if cell.is_falsy() {
            return None;
        }
        match cell {
            CellValue::Number(serial) => serial_to_date(*serial),
            CellValue::Date(dt) => datetime_to_date(*dt),
            CellValue::Text(s) => parse_date_text(s),
            CellValue::Empty => None,
        }
    }
}

/// 表格日期序列号 → 日期
///
/// 纪元 1899-12-30 + round(serial) 天；即 (serial - 25569) × 86400 秒距 Unix 纪元。
/// 非有限值或超出 9999-12-31 返回 None。
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial.round() as i64))
}

/// 日期时间 → 日期，与序列号同样四舍五入到天（12:00 及以后进到次日）
pub fn datetime_to_date(dt: NaiveDateTime) -> Option<NaiveDate> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0)?;
    if dt.time() >= noon {
        dt.date().succ_opt()
    } else {
        Some(dt.date())
    }
}

/// 文本日期解析（失败返回 None）
pub fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// 前缀浮点解析（"12h" → 12，"abc" → None）
///
/// 取最长的合法数值前缀：可选符号、整数部分、小数部分、指数。
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac = end + 1;
        let mut frac_digit = false;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
            frac_digit = true;
        }
        if seen_digit || frac_digit {
            end = frac;
            seen_digit = true;
        }
    }

    if !seen_digit {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits {
            end = exp;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_basic() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  buy  ", false), "buy");
        assert_eq!(cleaner.clean_text("  buy  ", true), "BUY");
    }

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some("  ".to_string())), None);
        assert_eq!(cleaner.normalize_null(Some("".to_string())), None);
        assert_eq!(
            cleaner.normalize_null(Some("  value  ".to_string())),
            Some("value".to_string())
        );
        assert_eq!(cleaner.normalize_null(None), None);
    }

    #[test]
    fn test_serial_to_date() {
        assert_eq!(serial_to_date(45658.0), NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(serial_to_date(UNIX_EPOCH_SERIAL), NaiveDate::from_ymd_opt(1970, 1, 1));
        // 小数部分四舍五入到天
        assert_eq!(serial_to_date(45658.6), NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(serial_to_date(f64::NAN), None);
        assert_eq!(serial_to_date(1e12), None);
    }

    #[test]
    fn test_datetime_rounds_like_serial() {
        let cleaner = DataCleaner;
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let at = |h, m| CellValue::Date(day.and_hms_opt(h, m, 0).unwrap());

        assert_eq!(cleaner.coerce_date(Some(&at(0, 0))), Some(day));
        assert_eq!(cleaner.coerce_date(Some(&at(11, 59))), Some(day));
        assert_eq!(cleaner.coerce_date(Some(&at(12, 0))), day.succ_opt());
        // 45658.6 = 2025-01-01 14:24
        assert_eq!(
            cleaner.coerce_date(Some(&at(14, 24))),
            serial_to_date(45658.6)
        );
    }

    #[test]
    fn test_coerce_date_variants() {
        let cleaner = DataCleaner;
        let expected = NaiveDate::from_ymd_opt(2025, 3, 15);

        assert_eq!(cleaner.coerce_date(Some(&CellValue::text("2025-03-15"))), expected);
        assert_eq!(cleaner.coerce_date(Some(&CellValue::text("15/03/2025"))), expected);
        assert_eq!(cleaner.coerce_date(Some(&CellValue::text("20250315"))), expected);
        assert_eq!(
            cleaner.coerce_date(Some(&CellValue::text("2025-03-15T08:30:00Z"))),
            expected
        );
        assert_eq!(
            cleaner.coerce_date(Some(&CellValue::Date(
                expected.unwrap().and_hms_opt(10, 0, 0).unwrap()
            ))),
            expected
        );
    }

    #[test]
    fn test_coerce_date_falsy_and_garbage() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.coerce_date(None), None);
        assert_eq!(cleaner.coerce_date(Some(&CellValue::Empty)), None);
        assert_eq!(cleaner.coerce_date(Some(&CellValue::Number(0.0))), None);
        assert_eq!(cleaner.coerce_date(Some(&CellValue::text(""))), None);
        assert_eq!(cleaner.coerce_date(Some(&CellValue::text("amanhã"))), None);
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("12"), Some(12.0));
        assert_eq!(parse_float_prefix("  12.5h"), Some(12.5));
        assert_eq!(parse_float_prefix("-3"), Some(-3.0));
        assert_eq!(parse_float_prefix(".75"), Some(0.75));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("2e"), Some(2.0));
        assert_eq!(parse_float_prefix("12,5"), Some(12.0));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix(""), None);
    }

    #[test]
    fn test_coerce_f64_defaults() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.coerce_f64(Some(&CellValue::Number(8.0))), 8.0);
        assert_eq!(cleaner.coerce_f64(Some(&CellValue::text("8"))), 8.0);
        assert_eq!(cleaner.coerce_f64(Some(&CellValue::text("n/a"))), 0.0);
        assert_eq!(cleaner.coerce_f64(Some(&CellValue::Number(f64::NAN))), 0.0);
        assert_eq!(cleaner.coerce_f64(Some(&CellValue::Empty)), 0.0);
        assert_eq!(cleaner.coerce_f64(None), 0.0);
    }

    #[test]
    fn test_coerce_text() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.coerce_text(Some(&CellValue::text(" ACME "))), Some("ACME".to_string()));
        assert_eq!(cleaner.coerce_text(Some(&CellValue::Number(10.0))), Some("10".to_string()));
        assert_eq!(cleaner.coerce_text(Some(&CellValue::text("   "))), None);
        assert_eq!(cleaner.coerce_text(None), None);
    }
}

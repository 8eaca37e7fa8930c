// ==========================================
// SIV-SITE 装配线 BOM 导入 - 表头定位器
// ==========================================
// 职责: 在前 N 行中查找含哨兵标签（默认 "ID"）的表头行
// 红线: 找不到即报错，绝不猜测表头行
// ==========================================

use crate::domain::cell::Grid;
use crate::importer::error::{ImportError, ImportResult};

/// 默认哨兵标签
pub const DEFAULT_HEADER_SENTINEL: &str = "ID";

/// 默认扫描行数（行号 0..30，不含 30）
pub const DEFAULT_HEADER_SCAN_LIMIT: usize = 30;

/// 定位表头行
///
/// # 参数
/// - grid: 工作表数据
/// - sentinel: 哨兵标签（TRIM + 忽略大小写全等比较）
/// - scan_limit: 扫描行数上限（不含）
///
/// # 返回
/// - Ok(usize): 表头行号（0 基）
/// - Err(HeaderNotFound): 扫描范围内无匹配
///
/// 只比较文本单元格；数值/日期/空单元格直接跳过。
pub fn locate_header(grid: &Grid, sentinel: &str, scan_limit: usize) -> ImportResult<usize> {
    let wanted = sentinel.trim().to_lowercase();

    grid.rows()
        .iter()
        .take(scan_limit)
        .position(|row| {
            row.iter().any(|cell| {
                cell.as_text()
                    .map(|text| text.trim().to_lowercase() == wanted)
                    .unwrap_or(false)
            })
        })
        .ok_or_else(|| ImportError::HeaderNotFound {
            sentinel: sentinel.to_string(),
            scan_limit,
        })
}

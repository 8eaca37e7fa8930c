// ==========================================
// SIV-SITE 装配线 BOM 导入 - 导入接口 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 文件读取 → 表头定位 → 列解析 → 行归一化 → 去重合并
// ==========================================

use crate::domain::cell::{CellValue, Grid};
use crate::importer::error::ImportResult;
use crate::importer::item_importer::ImportOutcome;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;

// ==========================================
// ItemImporter Trait
// ==========================================
// 用途: 物料项导入主接口
// 实现者: ItemImporterImpl
#[async_trait]
pub trait ItemImporter: Send + Sync {
    /// 从文件导入（按扩展名选择解析器）
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 归一化结果 + 分歧日志 + 统计
    /// - Err: 文件读取失败 / 表头未找到
    ///
    /// # 导入流程
    /// 1. 异步读取文件字节
    /// 2. 解码为 Grid
    /// 3. 表头定位（找不到则整体失败）
    /// 4. 列解析
    /// 5. 逐行归一化
    /// 6. 去重合并 + 分歧记录
    async fn import_from_file(&self, file_path: &Path) -> ImportResult<ImportOutcome>;

    /// 从已读取的字节导入
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于判断格式）
    /// - bytes: 完整文件内容
    async fn import_from_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ImportResult<ImportOutcome>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件独立导入，互不影响
    /// - 单个文件失败只体现在对应结果中
    async fn batch_import(&self, file_paths: Vec<std::path::PathBuf>) -> Vec<Result<ImportOutcome, String>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 表格来源读取（外部协作者）
// 实现者: ExcelParser, CsvParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为 Grid
    fn parse_to_grid(&self, file_path: &Path) -> ImportResult<Grid>;

    /// 解析内存中的文件内容为 Grid
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Grid>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗与类型转换
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// 清洗文本字段（TRIM + 可选 UPPER）
    fn clean_text(&self, value: &str, uppercase: bool) -> String;

    /// 标准化 NULL 值（空字符串/空白 → None）
    fn normalize_null(&self, value: Option<String>) -> Option<String>;

    /// 单元格 → 文本（空白 → None）
    fn coerce_text(&self, cell: Option<&CellValue>) -> Option<String>;

    /// 单元格 → 浮点数（解析失败/缺失 → 0）
    fn coerce_f64(&self, cell: Option<&CellValue>) -> f64;

    /// 单元格 → 日期
    ///
    /// # 规则
    /// - 数值: 视为表格日期序列号
    /// - 日期: 取日期部分
    /// - 文本: 按常见格式解析
    /// - 假值/无法解析: None（不报错）
    fn coerce_date(&self, cell: Option<&CellValue>) -> Option<NaiveDate>;
}

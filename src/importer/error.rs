// ==========================================
// SIV-SITE 装配线 BOM 导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 单元格类型转换从不报错（一律回退默认值），
//       分歧为非致命诊断，不在此枚举中
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作表不存在: {0}")]
    SheetNotFound(String),

    // ===== 表头定位错误（致命，不返回部分结果）=====
    #[error("未找到表头: 前 {scan_limit} 行中没有内容为 \"{sentinel}\" 的单元格")]
    HeaderNotFound { sentinel: String, scan_limit: usize },

    // ===== 去重合并错误（仅 RejectConflictPolicy 产生）=====
    #[error("重复项冲突 (行 {row}, id {item_id}, 阶段 \"{phase}\"): {message}")]
    DuplicateConflict {
        row: usize,
        item_id: String,
        phase: String,
        message: String,
    },

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为表头定位失败
    pub fn is_header_not_found(&self) -> bool {
        matches!(self, ImportError::HeaderNotFound { .. })
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// SIV-SITE 装配线 BOM 导入 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入错误为用户可读的错误消息
// 说明: 面向用户的消息随当前语言（i18n）
// ==========================================

use crate::i18n::t_with_args;
use crate::importer::error::ImportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 导入错误
    // ==========================================
    /// 表头未找到（致命，无部分结果）
    #[error("{message}")]
    HeaderNotFound {
        sentinel: String,
        scan_limit: usize,
        message: String, // 已本地化
    },

    #[error("{0}")]
    FileError(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("重复项冲突: {0}")]
    DuplicateConflict(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn is_header_not_found(&self) -> bool {
        matches!(self, ApiError::HeaderNotFound { .. })
    }
}

// ==========================================
// 从 ImportError 转换
// 目的: 将导入层的技术错误转换为用户可读的错误
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::HeaderNotFound {
                sentinel,
                scan_limit,
            } => {
                let limit = scan_limit.to_string();
                let message = t_with_args(
                    "import.header_not_found",
                    &[("sentinel", sentinel.as_str()), ("limit", limit.as_str())],
                );
                ApiError::HeaderNotFound {
                    sentinel,
                    scan_limit,
                    message,
                }
            }

            // 文件错误
            ImportError::FileNotFound(path) => {
                ApiError::FileError(t_with_args("import.file_not_found", &[("path", path.as_str())]))
            }
            ImportError::UnsupportedFormat(ext) => ApiError::FileError(t_with_args(
                "import.unsupported_format",
                &[("ext", ext.as_str())],
            )),
            ImportError::SheetNotFound(sheet) => ApiError::FileError(t_with_args(
                "import.sheet_not_found",
                &[("sheet", sheet.as_str())],
            )),
            ImportError::FileReadError(msg)
            | ImportError::ExcelParseError(msg)
            | ImportError::CsvParseError(msg) => ApiError::ImportError(msg),

            // 合并冲突
            err @ ImportError::DuplicateConflict { .. } => {
                ApiError::DuplicateConflict(err.to_string())
            }

            // 配置错误
            err @ ImportError::ConfigReadError { .. } | err @ ImportError::ConfigValueError { .. } => {
                ApiError::ConfigError(err.to_string())
            }

            // 通用错误
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

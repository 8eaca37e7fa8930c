// ==========================================
// SIV-SITE 装配线 BOM 导入 - 导入层
// ==========================================
// 职责: 外部表格 → 归一化 Item 集合
// 管道: Grid → 表头定位 → 列解析 → 行归一化 → 去重合并
// 支持: Excel (.xlsx/.xlsm/.xls/.ods), CSV
// ==========================================

// 模块声明
pub mod column_resolver;
pub mod data_cleaner;
pub mod duplicate_merger;
pub mod error;
pub mod file_parser;
pub mod header_locator;
pub mod item_importer;
pub mod item_importer_trait;
pub mod row_normalizer;

// 重导出核心类型
pub use column_resolver::{ColumnRule, HeaderMatcher, RuleTable};
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use duplicate_merger::{
    AccumulatePolicy, ConcatPolicy, DuplicateMerger, LastWinsPolicy, MergeOutcome, MergePolicy,
    MergePolicyKind, RejectConflictPolicy,
};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use header_locator::{locate_header, DEFAULT_HEADER_SCAN_LIMIT, DEFAULT_HEADER_SENTINEL};
pub use item_importer::{parse_grid, ImportOutcome, ItemImporterImpl, ParseOptions};
pub use row_normalizer::{RowNormalizer, RowOutcome};

// 重导出 Trait 接口
pub use item_importer_trait::{DataCleaner, FileParser, ItemImporter};

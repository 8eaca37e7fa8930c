// ==========================================
// SIV-SITE 装配线 BOM 导入 - 核心库
// ==========================================
// 系统定位: 将手工维护的 BOM 表格解析为类型化的物料项
// 流程: 表格 → 表头定位 → 列解析 → 行归一化 → 重复合并
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 单元格、字段、物料项、项目
pub mod domain;

// 导入层 - 表格解析管线
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 查询与统计
pub mod api;

// 应用层 - 显式状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CellValue, Divergence, DivergenceLog, Field, FieldMap, Grid, Item, ItemDefaults,
    ParseOutcome, ParseStats, Progress, ProgressStage, Project, ProjectRegistry,
};

// 导入管线
pub use importer::{
    locate_header, parse_grid, ImportError, ImportOutcome, ImportResult, ItemImporter,
    ItemImporterImpl, ParseOptions, RuleTable,
};

// 配置
pub use config::{ConfigManager, ImportConfigReader};

// API
pub use api::{ApiError, ApiResult, DashboardApi, HierarchyApi, ImportApi, ItemApi};

// 应用状态
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "SIV-SITE";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "SIV-SITE");
    }
}

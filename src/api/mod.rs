// ==========================================
// SIV-SITE 装配线 BOM 导入 - API 层
// ==========================================
// 职责: 面向界面层的数据接口（导入、查询、统计、层级树）
// 说明: 只返回数据，不做渲染
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod hierarchy_api;
pub mod import_api;
pub mod item_api;

// 重导出核心类型
pub use dashboard_api::{DashboardApi, ProjectDistribution, ProjectStats, StageStatusCount};
pub use error::{ApiError, ApiResult};
pub use hierarchy_api::{HierarchyApi, NodeKind, TreeNode};
pub use import_api::{ImportApi, ImportApiResponse};
pub use item_api::{FilterOptions, ItemApi, ItemPage, ItemQuery, SortDirection, SortKey};

// ==========================================
// SIV-SITE 装配线 BOM 导入 - 应用层
// ==========================================
// 职责: 应用状态（配置、项目注册表、当前项目）
// ==========================================

pub mod state;

// 重导出
pub use state::{AppState, TableState};

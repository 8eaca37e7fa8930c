// ==========================================
// SIV-SITE 装配线 BOM 导入 - 领域模型层
// ==========================================
// 职责: 定义单元格/表格、语义字段、物料项、导入结果、项目快照
// 红线: 不含文件读取逻辑,不含解析规则
// ==========================================

pub mod cell;
pub mod field;
pub mod import;
pub mod item;
pub mod project;

// 重导出核心类型
pub use cell::{CellValue, Grid};
pub use field::{Field, FieldMap, ProgressStage};
pub use import::{Divergence, DivergenceLog, ParseOutcome, ParseStats, DEFAULT_DIVERGENCE_PREVIEW};
pub use item::{Item, ItemDefaults, Progress, ProgressStatus};
pub use project::{Project, ProjectRegistry};

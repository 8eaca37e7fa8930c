// ==========================================
// SIV-SITE 装配线 BOM 导入 - 配置层
// ==========================================
// 职责: 导入参数管理（哨兵、扫描行数、合并策略、默认值等）
// 存储: 内存 KV，可从 JSON 文件加载
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{ConfigResult, ImportConfigReader};

// ==========================================
// SIV-SITE 装配线 BOM 导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::item::ItemDefaults;
use crate::importer::duplicate_merger::MergePolicyKind;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager（内存 KV，可从 JSON 文件加载）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 表头定位 =====

    /// 获取表头哨兵标签
    ///
    /// # 默认值
    /// - "ID"
    async fn get_header_sentinel(&self) -> ConfigResult<String>;

    /// 获取表头扫描行数（不含上限）
    ///
    /// # 默认值
    /// - 30
    async fn get_header_scan_limit(&self) -> ConfigResult<usize>;

    // ===== 列解析 =====

    /// 获取列匹配规则覆写（JSON: [{"field": ..., "matcher": ...}]）
    ///
    /// # 返回
    /// - None: 未配置，使用内置规则表
    async fn get_rule_overrides_json(&self) -> ConfigResult<Option<String>>;

    /// 获取禁用字段列表（该版本表格无此列，如 "transmission"）
    ///
    /// # 默认值
    /// - 空
    async fn get_disabled_fields(&self) -> ConfigResult<Vec<String>>;

    /// 获取工作表名（None = 第一个工作表）
    async fn get_sheet_name(&self) -> ConfigResult<Option<String>>;

    // ===== 行归一化 =====

    /// 获取字符串字段默认值
    async fn get_item_defaults(&self) -> ConfigResult<ItemDefaults>;

    /// 是否将进度值截断到 [0, 1]
    ///
    /// # 默认值
    /// - false
    async fn get_clamp_progress(&self) -> ConfigResult<bool>;

    // ===== 去重合并 =====

    /// 获取合并策略
    ///
    /// # 默认值
    /// - concat
    async fn get_merge_policy(&self) -> ConfigResult<MergePolicyKind>;

    /// 获取合并分隔符
    ///
    /// # 默认值
    /// - " | "
    async fn get_merge_separator(&self) -> ConfigResult<String>;

    /// 获取分歧摘要展示条数
    ///
    /// # 默认值
    /// - 5
    async fn get_divergence_preview_limit(&self) -> ConfigResult<usize>;
}

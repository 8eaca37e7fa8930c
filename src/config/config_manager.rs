// ==========================================
// SIV-SITE 装配线 BOM 导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: 内存 KV（key → value 字符串），可从 JSON 文件加载/保存
// 默认位置: <系统配置目录>/siv-site/config.json
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::domain::import::DEFAULT_DIVERGENCE_PREVIEW;
use crate::domain::item::ItemDefaults;
use crate::importer::duplicate_merger::{MergePolicyKind, DEFAULT_MERGE_SEPARATOR};
use crate::importer::header_locator::{DEFAULT_HEADER_SCAN_LIMIT, DEFAULT_HEADER_SENTINEL};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 应用配置目录名
const APP_CONFIG_DIR: &str = "siv-site";
const CONFIG_FILE_NAME: &str = "config.json";

/// 配置文件路径覆盖（环境变量）
pub const CONFIG_PATH_ENV: &str = "SIV_SITE_CONFIG_PATH";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl ConfigManager {
    /// 创建空配置（全部取默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 文件加载
    ///
    /// # 格式
    /// 扁平对象: {"header_sentinel": "ID", "header_scan_limit": 30}
    /// 非字符串值按 JSON 文本存储
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let parsed: BTreeMap<String, Value> = serde_json::from_str(raw)?;
        let values = parsed
            .into_iter()
            .map(|(key, value)| (key, value_to_string(value)))
            .collect();

        Ok(Self {
            values: Arc::new(Mutex::new(values)),
        })
    }

    /// 默认配置文件路径
    pub fn default_config_path() -> Option<PathBuf> {
        // 允许通过环境变量显式指定（便于调试/测试）
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        dirs::config_dir().map(|dir| dir.join(APP_CONFIG_DIR).join(CONFIG_FILE_NAME))
    }

    /// 从默认位置加载；文件不存在时返回空配置
    pub fn load_default() -> ConfigResult<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "加载配置文件");
                Self::from_json_file(path)
            }
            _ => Ok(Self::new()),
        }
    }

    /// 保存为 JSON 文件（自动创建父目录）
    pub fn save_to_json_file(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.get_config_snapshot()?)?;
        Ok(())
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        Ok(values.get(key).cloned())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（覆盖已有值）
    pub fn set_config_value(&self, key: &str, value: impl Into<String>) -> ConfigResult<()> {
        let mut values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        values.insert(key.to_string(), value.into());
        Ok(())
    }

    /// 删除配置值
    ///
    /// # 返回
    /// - Some: 被删除的旧值
    pub fn remove_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let mut values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        Ok(values.remove(key))
    }

    /// 获取所有配置的快照（JSON格式，键有序）
    ///
    /// # 用途
    /// - 记录导入时使用的配置
    /// - 保存到配置文件
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let ordered: BTreeMap<&String, &String> = values.iter().collect();
        Ok(serde_json::to_string(&json!(ordered))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名配置，保留快照中没有的配置
    /// - "__meta_" 前缀的键不回写
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let snapshot: BTreeMap<String, Value> = serde_json::from_str(snapshot_json)?;
        let mut values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut count = 0;
        for (key, value) in snapshot {
            if key.starts_with("__meta_") {
                continue;
            }
            values.insert(key, value_to_string(value));
            count += 1;
        }

        Ok(count)
    }

    fn parse_usize_or(&self, key: &str, default: usize) -> ConfigResult<usize> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.trim().parse::<usize>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %value, "配置值格式错误，使用默认值");
            default
        }))
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    // ===== 表头定位 =====

    async fn get_header_sentinel(&self) -> ConfigResult<String> {
        let value =
            self.get_config_or_default(config_keys::HEADER_SENTINEL, DEFAULT_HEADER_SENTINEL)?;
        if value.trim().is_empty() {
            Ok(DEFAULT_HEADER_SENTINEL.to_string())
        } else {
            Ok(value)
        }
    }

    async fn get_header_scan_limit(&self) -> ConfigResult<usize> {
        self.parse_usize_or(config_keys::HEADER_SCAN_LIMIT, DEFAULT_HEADER_SCAN_LIMIT)
    }

    // ===== 列解析 =====

    async fn get_rule_overrides_json(&self) -> ConfigResult<Option<String>> {
        Ok(self
            .get_config_value(config_keys::RULE_OVERRIDES)?
            .filter(|v| !v.trim().is_empty()))
    }

    async fn get_disabled_fields(&self) -> ConfigResult<Vec<String>> {
        let value = self.get_config_or_default(config_keys::DISABLED_FIELDS, "")?;

        Ok(value
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect())
    }

    async fn get_sheet_name(&self) -> ConfigResult<Option<String>> {
        Ok(self
            .get_config_value(config_keys::SHEET_NAME)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    // ===== 行归一化 =====

    async fn get_item_defaults(&self) -> ConfigResult<ItemDefaults> {
        match self.get_config_value(config_keys::ITEM_DEFAULTS)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(ItemDefaults::default()),
        }
    }

    async fn get_clamp_progress(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::CLAMP_PROGRESS, "false")?;
        Ok(matches!(
            value.trim().to_lowercase().as_str(),
            "true" | "1" | "yes"
        ))
    }

    // ===== 去重合并 =====

    async fn get_merge_policy(&self) -> ConfigResult<MergePolicyKind> {
        let value = self.get_config_or_default(config_keys::MERGE_POLICY, "concat")?;
        Ok(value.parse::<MergePolicyKind>()?)
    }

    async fn get_merge_separator(&self) -> ConfigResult<String> {
        // 分隔符允许首尾空格，不做 TRIM
        self.get_config_or_default(config_keys::MERGE_SEPARATOR, DEFAULT_MERGE_SEPARATOR)
    }

    async fn get_divergence_preview_limit(&self) -> ConfigResult<usize> {
        self.parse_usize_or(
            config_keys::DIVERGENCE_PREVIEW_LIMIT,
            DEFAULT_DIVERGENCE_PREVIEW,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 表头定位
    pub const HEADER_SENTINEL: &str = "header_sentinel";
    pub const HEADER_SCAN_LIMIT: &str = "header_scan_limit";

    // 列解析
    pub const RULE_OVERRIDES: &str = "rule_overrides"; // 规则覆写 (JSON)
    pub const DISABLED_FIELDS: &str = "disabled_fields"; // 逗号分隔
    pub const SHEET_NAME: &str = "sheet_name";

    // 行归一化
    pub const ITEM_DEFAULTS: &str = "item_defaults"; // 字符串默认值 (JSON)
    pub const CLAMP_PROGRESS: &str = "clamp_progress";

    // 去重合并
    pub const MERGE_POLICY: &str = "merge_policy";
    pub const MERGE_SEPARATOR: &str = "merge_separator";
    pub const DIVERGENCE_PREVIEW_LIMIT: &str = "divergence_preview_limit";

    // 界面
    pub const LOCALE: &str = "locale";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let config = ConfigManager::new();

        assert_eq!(config.get_header_sentinel().await.unwrap(), "ID");
        assert_eq!(config.get_header_scan_limit().await.unwrap(), 30);
        assert_eq!(config.get_divergence_preview_limit().await.unwrap(), 5);
        assert_eq!(config.get_merge_separator().await.unwrap(), " | ");
        assert_eq!(config.get_merge_policy().await.unwrap(), MergePolicyKind::Concat);
        assert!(!config.get_clamp_progress().await.unwrap());
        assert_eq!(config.get_item_defaults().await.unwrap(), ItemDefaults::default());
        assert!(config.get_disabled_fields().await.unwrap().is_empty());
        assert_eq!(config.get_sheet_name().await.unwrap(), None);
        assert_eq!(config.get_rule_overrides_json().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_from_json_str() {
        let config = ConfigManager::from_json_str(
            r#"{
                "header_scan_limit": 10,
                "clamp_progress": true,
                "merge_policy": "last_wins",
                "disabled_fields": "transmission, phase",
                "item_defaults": {"supplier": "Terceiro"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.get_header_scan_limit().await.unwrap(), 10);
        assert!(config.get_clamp_progress().await.unwrap());
        assert_eq!(config.get_merge_policy().await.unwrap(), MergePolicyKind::LastWins);
        assert_eq!(
            config.get_disabled_fields().await.unwrap(),
            vec!["transmission".to_string(), "phase".to_string()]
        );

        let defaults = config.get_item_defaults().await.unwrap();
        assert_eq!(defaults.supplier, "Terceiro");
        assert_eq!(defaults.client, "Geral");
    }

    #[tokio::test]
    async fn test_invalid_numeric_falls_back() {
        let config = ConfigManager::new();
        config
            .set_config_value(config_keys::HEADER_SCAN_LIMIT, "muitas")
            .unwrap();
        assert_eq!(config.get_header_scan_limit().await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_unknown_merge_policy_is_error() {
        let config = ConfigManager::new();
        config.set_config_value(config_keys::MERGE_POLICY, "vote").unwrap();
        assert!(config.get_merge_policy().await.is_err());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let config = ConfigManager::new();
        config.set_config_value(config_keys::HEADER_SENTINEL, "Código").unwrap();
        config.set_config_value(config_keys::MERGE_SEPARATOR, " / ").unwrap();

        let snapshot = config.get_config_snapshot().unwrap();

        let restored = ConfigManager::new();
        let count = restored
            .restore_config_from_snapshot(&snapshot)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            restored.get_config_value(config_keys::HEADER_SENTINEL).unwrap(),
            Some("Código".to_string())
        );
    }

    #[test]
    fn test_restore_skips_meta_keys() {
        let config = ConfigManager::new();
        let count = config
            .restore_config_from_snapshot(r#"{"__meta_name": "v1", "locale": "en"}"#)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(config.get_config_value("__meta_name").unwrap(), None);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = ConfigManager::new();
        config.set_config_value(config_keys::SHEET_NAME, "BOM").unwrap();
        config.save_to_json_file(&path).unwrap();

        let loaded = ConfigManager::from_json_file(&path).unwrap();
        assert_eq!(
            loaded.get_config_value(config_keys::SHEET_NAME).unwrap(),
            Some("BOM".to_string())
        );
        assert!(config.remove_config_value(config_keys::SHEET_NAME).unwrap().is_some());
    }
}

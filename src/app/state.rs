// ==========================================
// SIV-SITE 装配线 BOM 导入 - 应用状态
// ==========================================
// 职责: 持有配置、项目注册表、当前项目与表格状态
// 说明: 显式传引用，不使用全局单例
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::item_api::ItemQuery;
use crate::config::{config_keys, ConfigManager, ConfigResult};
use crate::domain::project::{Project, ProjectRegistry};
use crate::i18n;
use tracing::{info, warn};

/// 表格视图状态（切换项目时重置）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    pub query: ItemQuery,
    pub tree_search: String,
}

impl TableState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 应用状态
pub struct AppState {
    pub config: ConfigManager,
    pub projects: ProjectRegistry,
    pub active_project: Option<String>,
    pub table: TableState,
}

impl AppState {
    pub fn new(config: ConfigManager) -> Self {
        Self {
            config,
            projects: ProjectRegistry::new(),
            active_project: None,
            table: TableState::default(),
        }
    }

    /// 从默认配置文件创建，并应用配置中的语言
    pub fn load_default() -> ConfigResult<Self> {
        let config = ConfigManager::load_default()?;
        if let Some(locale) = config.get_config_value(config_keys::LOCALE)? {
            if !i18n::set_locale(locale.trim()) {
                warn!(locale = %locale, "配置的语言不受支持，保持当前语言");
            }
        }
        Ok(Self::new(config))
    }

    /// 注册项目并设为当前项目
    pub fn register(&mut self, project: Project) -> String {
        let project_id = self.projects.add(project);
        self.active_project = Some(project_id.clone());
        self.table.reset();
        project_id
    }

    /// 切换当前项目
    ///
    /// # 返回
    /// - Err(NotFound): 项目不存在（当前项目不变）
    pub fn activate(&mut self, project_id: &str) -> ApiResult<()> {
        if self.projects.get(project_id).is_none() {
            return Err(ApiError::NotFound(i18n::t_with_args(
                "project.not_found",
                &[("id", project_id)],
            )));
        }
        if self.active_project.as_deref() != Some(project_id) {
            info!(project_id, "切换当前项目");
            self.active_project = Some(project_id.to_string());
            self.table.reset();
        }
        Ok(())
    }

    pub fn active(&self) -> Option<&Project> {
        self.active_project
            .as_deref()
            .and_then(|id| self.projects.get(id))
    }

    /// 当前项目（不存在时返回 NotFound）
    pub fn require_active(&self) -> ApiResult<&Project> {
        self.active()
            .ok_or_else(|| ApiError::NotFound(i18n::t("project.no_active")))
    }

    /// 删除项目；删除的是当前项目时清空当前项目
    pub fn remove(&mut self, project_id: &str) -> Option<Project> {
        let removed = self.projects.remove(project_id)?;
        if self.active_project.as_deref() == Some(project_id) {
            self.active_project = None;
            self.table.reset();
        }
        Some(removed)
    }
}

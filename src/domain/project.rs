// ==========================================
// SIV-SITE 装配线 BOM 导入 - 项目快照与注册表
// ==========================================
// 职责: 每次导入形成一个命名项目，持有不可变的 Item 快照
// 红线: 快照创建后不可修改；注册表只增删，不改写快照
// ==========================================

use crate::domain::import::{DivergenceLog, ParseStats};
use crate::domain::item::Item;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// Project - 项目快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,          // 项目 ID（UUID）
    pub name: String,                // 项目名称
    pub source_file: Option<String>, // 来源文件名
    pub imported_at: DateTime<Utc>,  // 导入时间
    pub items: Arc<[Item]>,          // 不可变快照
    pub divergences: DivergenceLog,
    pub stats: ParseStats,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        source_file: Option<String>,
        items: Vec<Item>,
        divergences: DivergenceLog,
        stats: ParseStats,
    ) -> Self {
        Self {
            project_id: Uuid::new_v4().to_string(),
            name: name.into(),
            source_file,
            imported_at: Utc::now(),
            items: Arc::from(items),
            divergences,
            stats,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

// ==========================================
// ProjectRegistry - 项目注册表
// ==========================================
// 保持导入顺序
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: Vec<Project>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册项目，返回项目 ID
    pub fn add(&mut self, project: Project) -> String {
        let id = project.project_id.clone();
        self.projects.push(project);
        id
    }

    pub fn get(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.project_id == project_id)
    }

    /// 名称匹配（忽略大小写与首尾空白），返回最近导入的一个
    pub fn find_by_name(&self, name: &str) -> Option<&Project> {
        let wanted = name.trim().to_lowercase();
        self.projects
            .iter()
            .rev()
            .find(|p| p.name.trim().to_lowercase() == wanted)
    }

    pub fn remove(&mut self, project_id: &str) -> Option<Project> {
        let pos = self.projects.iter().position(|p| p.project_id == project_id)?;
        Some(self.projects.remove(pos))
    }

    pub fn list(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_project(name: &str) -> Project {
        Project::new(name, None, Vec::new(), DivergenceLog::new(), ParseStats::default())
    }

    #[test]
    fn test_registry_add_get_remove() {
        let mut registry = ProjectRegistry::new();
        let first = registry.add(empty_project("Linha Body Shop"));
        let second = registry.add(empty_project("Linha Pintura"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&first).map(|p| p.name.as_str()), Some("Linha Body Shop"));

        let removed = registry.remove(&first).unwrap();
        assert_eq!(removed.project_id, first);
        assert!(registry.get(&first).is_none());
        assert!(registry.get(&second).is_some());
        assert!(registry.remove("missing").is_none());
    }

    #[test]
    fn test_find_by_name_prefers_latest() {
        let mut registry = ProjectRegistry::new();
        registry.add(empty_project("Linha A"));
        let latest = registry.add(empty_project(" linha a "));

        let found = registry.find_by_name("LINHA A").unwrap();
        assert_eq!(found.project_id, latest);
    }
}

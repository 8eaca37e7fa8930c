// ==========================================
// SIV-SITE 装配线 BOM 导入 - 层级视图 API
// ==========================================
// 职责: Item 集合 → 项目 / 跟踪码 / 物料项 三级树
// 顺序: 各层按首次出现顺序
// ==========================================

use crate::domain::item::Item;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Project,
    Transmission,
    Item,
}

/// 树节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub key: String,
    pub label: String,
    pub item_count: usize, // 子树中的物料项数
    pub hours: f64,        // 子树工时合计
    pub progress: f64,     // 子树平均完成率
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(item: &Item) -> Self {
        let key = match &item.phase {
            Some(phase) => format!("{}/{}", item.id, phase),
            None => item.id.clone(),
        };
        Self {
            kind: NodeKind::Item,
            key,
            label: format!("{} - {}", item.id, item.description),
            item_count: 1,
            hours: item.hours,
            progress: item.progress.overall(),
            children: Vec::new(),
        }
    }

    fn branch(kind: NodeKind, key: &str, label: &str) -> Self {
        Self {
            kind,
            key: key.to_string(),
            label: label.to_string(),
            item_count: 0,
            hours: 0.0,
            progress: 0.0,
            children: Vec::new(),
        }
    }

    /// 按子节点重算汇总值
    fn recompute(&mut self) {
        if self.kind == NodeKind::Item {
            return;
        }
        let mut count = 0;
        let mut hours = 0.0;
        let mut weighted = 0.0;
        for child in &self.children {
            count += child.item_count;
            hours += child.hours;
            weighted += child.progress * child.item_count as f64;
        }
        self.item_count = count;
        self.hours = hours;
        self.progress = if count > 0 { weighted / count as f64 } else { 0.0 };
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyApi;

impl HierarchyApi {
    pub fn new() -> Self {
        Self
    }

    /// 构建 项目 → 跟踪码 → 物料项 树
    ///
    /// 空项目名显示为 "-"
    pub fn build_tree(&self, items: &[Item]) -> Vec<TreeNode> {
        let mut roots: Vec<TreeNode> = Vec::new();

        for item in items {
            let project = if item.project.trim().is_empty() {
                "-"
            } else {
                item.project.as_str()
            };

            let root_idx = match roots.iter().position(|n| n.key == project) {
                Some(idx) => idx,
                None => {
                    roots.push(TreeNode::branch(NodeKind::Project, project, project));
                    roots.len() - 1
                }
            };
            let root = &mut roots[root_idx];

            let transmission = item.transmission.as_str();
            let branch_idx = match root.children.iter().position(|n| n.key == transmission) {
                Some(idx) => idx,
                None => {
                    root.children.push(TreeNode::branch(
                        NodeKind::Transmission,
                        transmission,
                        transmission,
                    ));
                    root.children.len() - 1
                }
            };

            root.children[branch_idx].children.push(TreeNode::leaf(item));
        }

        for root in roots.iter_mut() {
            for branch in root.children.iter_mut() {
                branch.recompute();
            }
            root.recompute();
        }

        roots
    }

    /// 搜索树（忽略大小写）
    ///
    /// # 规则
    /// - 节点标签匹配: 保留整棵子树
    /// - 否则仅保留含匹配后代的分支（汇总值按剩余子树重算）
    /// - 空查询返回原树
    pub fn search_tree(&self, tree: &[TreeNode], query: &str) -> Vec<TreeNode> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return tree.to_vec();
        }
        tree.iter().filter_map(|node| prune(node, &needle)).collect()
    }
}

fn prune(node: &TreeNode, needle: &str) -> Option<TreeNode> {
    if node.label.to_lowercase().contains(needle) || node.key.to_lowercase().contains(needle) {
        return Some(node.clone());
    }

    let children: Vec<TreeNode> = node
        .children
        .iter()
        .filter_map(|child| prune(child, needle))
        .collect();
    if children.is_empty() {
        return None;
    }

    let mut pruned = TreeNode {
        children,
        ..TreeNode::branch(node.kind, &node.key, &node.label)
    };
    pruned.recompute();
    Some(pruned)
}

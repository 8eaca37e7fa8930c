// ==========================================
// SIV-SITE 装配线 BOM 导入 - 驾驶舱 API
// ==========================================
// 职责: 项目级聚合统计（总量、自制/外购、工时、阶段进度、逾期）
// 说明: 纯计算，不持有状态；today 由调用方传入
// ==========================================

use crate::domain::field::ProgressStage;
use crate::domain::item::{Item, ProgressStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ==========================================
// 统计结构
// ==========================================

/// 单个进度阶段的状态分布
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageStatusCount {
    pub stage: ProgressStage,
    pub complete: usize, // >= 1
    pub partial: usize,  // (0, 1)
    pub pending: usize,  // <= 0
}

/// 项目统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub total_items: usize,
    pub distinct_clients: usize,
    pub distinct_projects: usize,
    pub distinct_transmissions: usize,
    pub make_count: usize,
    pub buy_count: usize,
    pub total_hours: f64,
    pub total_labor_value: f64,
    pub overall_progress: f64, // 各项平均完成率的平均值
    pub complete_items: usize, // 六个阶段全部完成
    pub overdue_items: usize,  // 最终交付日期早于 today 且未全部完成
    pub stages: Vec<StageStatusCount>,
}

/// 按项目分布
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDistribution {
    pub project: String,
    pub items: usize,
    pub hours: f64,
}

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardApi;

impl DashboardApi {
    pub fn new() -> Self {
        Self
    }

    /// 计算项目统计
    ///
    /// # 参数
    /// - items: 项目的 Item 快照
    /// - today: 逾期判定基准日
    pub fn project_stats(&self, items: &[Item], today: NaiveDate) -> ProjectStats {
        let mut clients = HashSet::new();
        let mut projects = HashSet::new();
        let mut transmissions = HashSet::new();

        let mut stages: Vec<StageStatusCount> = ProgressStage::ALL
            .iter()
            .map(|stage| StageStatusCount {
                stage: *stage,
                complete: 0,
                partial: 0,
                pending: 0,
            })
            .collect();

        let mut stats = ProjectStats {
            total_items: items.len(),
            distinct_clients: 0,
            distinct_projects: 0,
            distinct_transmissions: 0,
            make_count: 0,
            buy_count: 0,
            total_hours: 0.0,
            total_labor_value: 0.0,
            overall_progress: 0.0,
            complete_items: 0,
            overdue_items: 0,
            stages: Vec::new(),
        };

        let mut progress_sum = 0.0;
        for item in items {
            clients.insert(item.client.as_str());
            if !item.project.is_empty() {
                projects.insert(item.project.as_str());
            }
            transmissions.insert(item.transmission.as_str());

            if item.is_make() {
                stats.make_count += 1;
            } else if item.is_buy() {
                stats.buy_count += 1;
            }

            stats.total_hours += item.hours;
            stats.total_labor_value += item.labor_value;
            progress_sum += item.progress.overall();

            for counter in stages.iter_mut() {
                match item.progress.status(counter.stage) {
                    ProgressStatus::Complete => counter.complete += 1,
                    ProgressStatus::Partial => counter.partial += 1,
                    ProgressStatus::Pending => counter.pending += 1,
                }
            }

            let complete = item.progress.is_complete();
            if complete {
                stats.complete_items += 1;
            }
            if !complete && item.final_delivery_date.is_some_and(|d| d < today) {
                stats.overdue_items += 1;
            }
        }

        stats.distinct_clients = clients.len();
        stats.distinct_projects = projects.len();
        stats.distinct_transmissions = transmissions.len();
        if !items.is_empty() {
            stats.overall_progress = progress_sum / items.len() as f64;
        }
        stats.stages = stages;
        stats
    }

    /// 按项目分布（条数降序，同数按名称升序）
    ///
    /// 空项目名归入 "-"
    pub fn distribution_by_project(&self, items: &[Item]) -> Vec<ProjectDistribution> {
        let mut grouped: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        for item in items {
            let key = if item.project.trim().is_empty() {
                "-"
            } else {
                item.project.as_str()
            };
            let entry = grouped.entry(key).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += item.hours;
        }

        let mut distribution: Vec<ProjectDistribution> = grouped
            .into_iter()
            .map(|(project, (count, hours))| ProjectDistribution {
                project: project.to_string(),
                items: count,
                hours,
            })
            .collect();

        // BTreeMap 已按名称排序；稳定排序保留同数时的名称顺序
        distribution.sort_by(|a, b| b.items.cmp(&a.items));
        distribution
    }
}

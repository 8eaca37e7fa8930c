// ==========================================
// SIV-SITE 装配线 BOM 导入 - 物料项查询 API
// ==========================================
// 职责: 物料表格的搜索 / 筛选 / 排序 / 分页（只返回数据，不做渲染）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::item::Item;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// 每页条数上限
pub const MAX_PAGE_SIZE: usize = 500;

// ==========================================
// 排序
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Row,
    Id,
    Client,
    Project,
    Description,
    Supplier,
    Transmission,
    Hours,
    LaborValue,
    SupplierDeliveryDate,
    FinalDeliveryDate,
    Progress,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl SortKey {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        match self {
            SortKey::Row => a.row_number.cmp(&b.row_number),
            SortKey::Id => cmp_text(&a.id, &b.id),
            SortKey::Client => cmp_text(&a.client, &b.client),
            SortKey::Project => cmp_text(&a.project, &b.project),
            SortKey::Description => cmp_text(&a.description, &b.description),
            SortKey::Supplier => cmp_text(&a.supplier, &b.supplier),
            SortKey::Transmission => cmp_text(&a.transmission, &b.transmission),
            SortKey::Hours => a.hours.total_cmp(&b.hours),
            SortKey::LaborValue => a.labor_value.total_cmp(&b.labor_value),
            SortKey::SupplierDeliveryDate => a.supplier_delivery_date.cmp(&b.supplier_delivery_date),
            SortKey::FinalDeliveryDate => a.final_delivery_date.cmp(&b.final_delivery_date),
            SortKey::Progress => a.progress.overall().total_cmp(&b.progress.overall()),
        }
    }
}

// ==========================================
// ItemQuery - 表格查询条件
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemQuery {
    pub search: String,               // 关键字（忽略大小写）
    pub client: Option<String>,       // 精确筛选
    pub project: Option<String>,
    pub transmission: Option<String>,
    pub make_buy: Option<String>,     // MAKE / BUY
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub page: usize,                  // 1 基
    pub page_size: usize,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            client: None,
            project: None,
            transmission: None,
            make_buy: None,
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ItemQuery {
    fn matches(&self, item: &Item, needle: &str) -> bool {
        let exact = |filter: &Option<String>, value: &str| match filter {
            Some(f) if !f.trim().is_empty() => f.trim().eq_ignore_ascii_case(value.trim()),
            _ => true,
        };

        if !exact(&self.client, &item.client)
            || !exact(&self.project, &item.project)
            || !exact(&self.transmission, &item.transmission)
            || !exact(&self.make_buy, &item.make_buy)
        {
            return false;
        }

        if needle.is_empty() {
            return true;
        }
        [
            item.id.as_str(),
            item.description.as_str(),
            item.client.as_str(),
            item.project.as_str(),
            item.transmission.as_str(),
            item.supplier.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

// ==========================================
// ItemPage - 分页结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub total: usize,       // 筛选后的总条数
    pub page: usize,        // 实际页码（已截断到有效范围）
    pub page_size: usize,
    pub total_pages: usize, // 至少为 1
}

// ==========================================
// FilterOptions - 筛选下拉选项
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub clients: Vec<String>,
    pub projects: Vec<String>,
    pub transmissions: Vec<String>,
    pub make_buy: Vec<String>,
}

// ==========================================
// ItemApi - 物料项查询 API
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemApi;

impl ItemApi {
    pub fn new() -> Self {
        Self
    }

    /// 查询物料项
    ///
    /// # 处理顺序
    /// 1. 筛选（精确条件 + 关键字）
    /// 2. 排序（稳定排序，同值按原行号）
    /// 3. 分页（页码截断到 [1, total_pages]）
    ///
    /// # 返回
    /// - Err(InvalidInput): page_size 为 0 或超过上限
    pub fn query(&self, items: &[Item], query: &ItemQuery) -> ApiResult<ItemPage> {
        if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
            return Err(ApiError::InvalidInput(format!(
                "page_size 应在 1-{} 之间: {}",
                MAX_PAGE_SIZE, query.page_size
            )));
        }

        let needle = query.search.trim().to_lowercase();
        let mut filtered: Vec<&Item> = items
            .iter()
            .filter(|item| query.matches(item, &needle))
            .collect();

        filtered.sort_by(|a, b| {
            let ordering = query.sort_key.compare(a, b);
            let ordering = match query.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.row_number.cmp(&b.row_number))
        });

        let total = filtered.len();
        let total_pages = total.div_ceil(query.page_size).max(1);
        let page = query.page.clamp(1, total_pages);

        let items = filtered
            .into_iter()
            .skip((page - 1) * query.page_size)
            .take(query.page_size)
            .cloned()
            .collect();

        Ok(ItemPage {
            items,
            total,
            page,
            page_size: query.page_size,
            total_pages,
        })
    }

    /// 筛选选项（去重、排序）
    ///
    /// # 参数
    /// - project: 仅统计该项目下的选项（None = 全部）
    pub fn filter_options(&self, items: &[Item], project: Option<&str>) -> FilterOptions {
        let mut clients = BTreeSet::new();
        let mut projects = BTreeSet::new();
        let mut transmissions = BTreeSet::new();
        let mut make_buy = BTreeSet::new();

        for item in items {
            // 项目列表不受 project 参数影响
            if !item.project.is_empty() {
                projects.insert(item.project.clone());
            }
            if let Some(p) = project {
                if !item.project.eq_ignore_ascii_case(p) {
                    continue;
                }
            }
            clients.insert(item.client.clone());
            transmissions.insert(item.transmission.clone());
            make_buy.insert(item.make_buy.clone());
        }

        FilterOptions {
            clients: clients.into_iter().collect(),
            projects: projects.into_iter().collect(),
            transmissions: transmissions.into_iter().collect(),
            make_buy: make_buy.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{ItemDefaults, Progress};

    fn item(id: &str, client: &str, project: &str, hours: f64, row: usize) -> Item {
        let defaults = ItemDefaults::default();
        Item {
            id: id.to_string(),
            client: client.to_string(),
            project: project.to_string(),
            operation: defaults.operation,
            description: format!("Peça {}", id),
            supplier: defaults.supplier,
            make_buy: if row % 2 == 0 { "MAKE" } else { "BUY" }.to_string(),
            transmission: format!("T{}", row % 3),
            supplier_delivery_date: None,
            final_delivery_date: None,
            hours,
            labor_value: 0.0,
            progress: Progress::default(),
            phase: None,
            plan: None,
            actual: None,
            row_number: row,
        }
    }

    fn sample() -> Vec<Item> {
        vec![
            item("A1", "ACME", "Linha 1", 12.0, 2),
            item("A2", "Bosch", "Linha 1", 3.0, 3),
            item("B1", "acme", "Linha 2", 7.5, 4),
            item("B2", "Geral", "Linha 2", 0.0, 5),
        ]
    }

    #[test]
    fn test_default_query_returns_row_order() {
        let page = ItemApi.query(&sample(), &ItemQuery::default()).unwrap();
        let ids: Vec<_> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "B1", "B2"]);
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let query = ItemQuery {
            search: "  peça b".to_string(),
            ..ItemQuery::default()
        };
        let page = ItemApi.query(&sample(), &query).unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_exact_filters() {
        let query = ItemQuery {
            client: Some("ACME".to_string()),
            project: Some("Linha 2".to_string()),
            ..ItemQuery::default()
        };
        let page = ItemApi.query(&sample(), &query).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "B1");
    }

    #[test]
    fn test_sort_by_hours_desc() {
        let query = ItemQuery {
            sort_key: SortKey::Hours,
            direction: SortDirection::Desc,
            ..ItemQuery::default()
        };
        let page = ItemApi.query(&sample(), &query).unwrap();
        let ids: Vec<_> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_pagination_clamps_page() {
        let query = ItemQuery {
            page: 9,
            page_size: 3,
            ..ItemQuery::default()
        };
        let page = ItemApi.query(&sample(), &query).unwrap();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "B2");
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let query = ItemQuery {
            search: "inexistente".to_string(),
            page: 0,
            ..ItemQuery::default()
        };
        let page = ItemApi.query(&sample(), &query).unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_invalid_page_size() {
        let query = ItemQuery {
            page_size: 0,
            ..ItemQuery::default()
        };
        assert!(matches!(
            ItemApi.query(&sample(), &query),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_filter_options() {
        let items = sample();
        let all = ItemApi.filter_options(&items, None);
        assert_eq!(all.projects, vec!["Linha 1".to_string(), "Linha 2".to_string()]);
        assert_eq!(all.make_buy, vec!["BUY".to_string(), "MAKE".to_string()]);

        let scoped = ItemApi.filter_options(&items, Some("linha 1"));
        assert_eq!(scoped.clients, vec!["ACME".to_string(), "Bosch".to_string()]);
        assert_eq!(scoped.projects.len(), 2);
    }
}

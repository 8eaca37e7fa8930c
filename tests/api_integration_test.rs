// ==========================================
// API 层集成测试
// ==========================================
// 测试目标: 导入 → 注册项目 → 表格查询 / 驾驶舱统计 / 层级树
// ==========================================


use chrono::NaiveDate;
use siv_site::api::{
    ApiError, DashboardApi, HierarchyApi, ImportApi, ItemApi, ItemQuery, SortDirection, SortKey,
};
use siv_site::app::AppState;
use siv_site::config::{config_keys, ConfigManager};
use siv_site::logging;
use test_helpers::write_csv;

const BOM_CSV: &str = "\
Montagem linha 3 - revisão 2
ID,Cliente,Projeto,Descrição,Transmissão,Make/Buy,Horas,Valor MO,Entrega final,Bordo,Fase,Realizado
A1,ACME,Linha 3,Chassi,TR-01,make,12,1200,2025-01-10,1,Solda,8
A2,ACME,Linha 3,Suporte,TR-01,buy,4,0,2025-03-01,0.5,Solda,2
A2,ACME,Linha 3,Suporte,TR-01,buy,4,0,2025-03-01,0.5,Solda,3
B1,Bosch,Linha 4,Painel,TR-07,make,6,600,,0,Pintura,0
X9,,,,,,0,0,,0,,
";

async fn imported_state() -> (AppState, String) {
    logging::init_test();

    let file = write_csv(BOM_CSV).unwrap();
    let config = ConfigManager::new();
    let api = ImportApi::new(config.clone());
    let mut state = AppState::new(config);

    let response = api
        .import_project(&mut state, file.path(), Some("Linha 3"))
        .await
        .unwrap();
    (state, response.project_id)
}

#[tokio::test]
async fn test_import_response_counts() {
    let file = write_csv(BOM_CSV).unwrap();
    let config = ConfigManager::new();
    let api = ImportApi::new(config.clone());
    let mut state = AppState::new(config);

    let response = api.import_project(&mut state, file.path(), None).await.unwrap();

    assert_eq!(response.imported, 3);
    assert_eq!(response.data_rows, 5);
    assert_eq!(response.merged_duplicates, 1);
    assert_eq!(response.skipped_noise, 1);
    assert_eq!(response.divergence_count, 1);

    let notice = response.divergence_notice.unwrap();
    assert!(notice.contains("A2"));
    assert!(!response.unmapped_fields.contains(&"id".to_string()));

    let project = state.active().unwrap();
    let merged = project.items().iter().find(|i| i.id == "A2").unwrap();
    assert_eq!(merged.actual.as_deref(), Some("2 | 3"));
}

#[tokio::test]
async fn test_item_query_on_active_project() {
    let (state, _) = imported_state().await;
    let items = state.require_active().unwrap().items();

    let query = ItemQuery {
        client: Some("acme".to_string()),
        sort_key: SortKey::Hours,
        direction: SortDirection::Desc,
        ..ItemQuery::default()
    };
    let page = ItemApi::new().query(items, &query).unwrap();

    let ids: Vec<_> = page.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["A1", "A2"]);

    let options = ItemApi::new().filter_options(items, None);
    assert_eq!(options.make_buy, vec!["BUY".to_string(), "MAKE".to_string()]);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let (state, _) = imported_state().await;
    let items = state.require_active().unwrap().items();

    let stats = DashboardApi::new().project_stats(items, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.make_count, 2);
    assert_eq!(stats.buy_count, 1);
    assert_eq!(stats.total_hours, 22.0);
    assert_eq!(stats.total_labor_value, 1800.0);
    // A1 的最终交付日期已过且未全部完成
    assert_eq!(stats.overdue_items, 1);

    let distribution = DashboardApi::new().distribution_by_project(items);
    assert_eq!(distribution[0].project, "Linha 3");
    assert_eq!(distribution[0].items, 2);
}

#[tokio::test]
async fn test_hierarchy_tree_and_search() {
    let (state, _) = imported_state().await;
    let items = state.require_active().unwrap().items();

    let api = HierarchyApi::new();
    let tree = api.build_tree(items);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].item_count, 2);

    let found = api.search_tree(&tree, "painel");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key, "Linha 4");
}

#[tokio::test]
async fn test_header_not_found_via_config_sentinel() {
    let file = write_csv(BOM_CSV).unwrap();
    let config = ConfigManager::new();
    config
        .set_config_value(config_keys::HEADER_SENTINEL, "Código")
        .unwrap();
    let api = ImportApi::new(config.clone());
    let mut state = AppState::new(config);

    let err = api.import_project(&mut state, file.path(), None).await.unwrap_err();
    match err {
        ApiError::HeaderNotFound {
            sentinel,
            scan_limit,
            ..
        } => {
            assert_eq!(sentinel, "Código");
            assert_eq!(scan_limit, 30);
        }
        other => panic!("expected HeaderNotFound, got {:?}", other),
    }
    assert!(state.projects.is_empty());
}

#[tokio::test]
async fn test_switch_between_projects() {
    let (mut state, first) = imported_state().await;

    let file = write_csv("ID,Horas\nZ1,2\n").unwrap();
    let api = ImportApi::new(state.config.clone());
    let second = api
        .import_project(&mut state, file.path(), Some("Avulso"))
        .await
        .unwrap();

    assert_eq!(state.projects.len(), 2);
    assert_eq!(state.active_project.as_deref(), Some(second.project_id.as_str()));

    state.activate(&first).unwrap();
    assert_eq!(state.active().unwrap().name, "Linha 3");
}

// ==========================================
// 存储生命周期集成测试
// ==========================================
// 测试目标: 新库建表、旧库增量迁移、重开后数据保留
// ==========================================


use rusqlite::Connection;
use sinapi_budget::domain::{BudgetLine, LineKind};
use sinapi_budget::repository::schema;
use sinapi_budget::Store;
use test_helpers::create_test_store;

#[test]
fn test_data_survives_reopen() {
    let (_dir, store, db_path) = create_test_store().unwrap();
    let project_id = store.projects().create("Reforma", "Apartamento 302", 25.0).unwrap();
    drop(store);

    let reopened = Store::open(&db_path).unwrap();
    let project = reopened.projects().find(project_id).unwrap().unwrap();
    assert_eq!(project.description, "Apartamento 302");
    assert_eq!(project.markup_pct, 25.0);
}

#[test]
fn test_open_old_database_adds_missing_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("legado.db");
    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT, description TEXT, created_on TEXT, updated_on TEXT
            );
            INSERT INTO projects (name, description, created_on, updated_on)
            VALUES ('Casa antiga', '', '2023-02-01 10:00:00', '2023-02-01 10:00:00');",
        )
        .unwrap();
    }

    let store = Store::open(db_path.to_str().unwrap()).unwrap();
    let projects = store.projects().list().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].markup_pct, 25.0);
    assert!(projects[0].saved);

    // 迁移后新表可用
    let line = BudgetLine {
        id: None,
        project_id: projects[0].id,
        kind: LineKind::Composite,
        code: "87292".to_string(),
        description: "ARGAMASSA".to_string(),
        unit: "M3".to_string(),
        quantity: 2.0,
        unit_price: 500.0,
    };
    store.budget_lines().insert(&line).unwrap();
    assert_eq!(store.budget_lines().subtotal(projects[0].id).unwrap(), 1000.0);

    // 再次检查无迁移步骤
    let conn = store.connection();
    let guard = conn.lock().unwrap();
    assert_eq!(schema::run_migrations(&guard).unwrap(), 0);
}

#[test]
fn test_deleting_project_cascades_lines() {
    let (_dir, store, _) = create_test_store().unwrap();
    let project_id = store.projects().create("Obra", "", 25.0).unwrap();
    let line = BudgetLine {
        id: None,
        project_id,
        kind: LineKind::Item,
        code: "00001".to_string(),
        description: "ACETILENO".to_string(),
        unit: "KG".to_string(),
        quantity: 1.0,
        unit_price: 59.49,
    };
    store.budget_lines().insert(&line).unwrap();

    store.projects().delete(project_id).unwrap();
    assert!(store.budget_lines().list_by_project(project_id).unwrap().is_empty());
}

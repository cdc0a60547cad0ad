// ==========================================
// SINAPI 预算系统 - 表结构与增量迁移
// ==========================================
// 新库: 一次性建全部表
// 旧库: 逐项探测（执行依赖 schema 的查询）,失败则执行一条
// CREATE/ALTER 后继续,不因旧结构而启动失败
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use tracing::{debug, info};

const CREATE_ITEMS: &str = r#"
    CREATE TABLE IF NOT EXISTS items (
        code TEXT PRIMARY KEY,
        description TEXT,
        unit TEXT,
        reference_price REAL,
        source TEXT,
        reference_period TEXT,
        updated_on TEXT
    )
"#;

const CREATE_COMPOSITES: &str = r#"
    CREATE TABLE IF NOT EXISTS composites (
        code TEXT PRIMARY KEY,
        description TEXT,
        unit TEXT,
        total_cost REAL,
        source TEXT,
        reference_period TEXT,
        updated_on TEXT
    )
"#;

// component_code 可能指向 items 或 composites,读取时回退 JOIN,不设外键
const CREATE_COMPOSITE_LINKS: &str = r#"
    CREATE TABLE IF NOT EXISTS composite_links (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        composite_code TEXT NOT NULL REFERENCES composites(code),
        component_code TEXT NOT NULL,
        coefficient REAL
    )
"#;

const CREATE_COMPOSITE_LINKS_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_composite_links_composite
    ON composite_links(composite_code)
"#;

const CREATE_PROJECTS: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        description TEXT,
        created_on TEXT,
        updated_on TEXT,
        markup_pct REAL DEFAULT 25.0,
        saved_flag INTEGER DEFAULT 1
    )
"#;

const CREATE_BUDGET_LINES: &str = r#"
    CREATE TABLE IF NOT EXISTS budget_lines (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        kind TEXT NOT NULL,
        code TEXT NOT NULL,
        description TEXT,
        unit TEXT,
        quantity REAL,
        unit_price REAL
    )
"#;

/// 表名与建表语句（按依赖顺序）
const TABLES: &[(&str, &str)] = &[
    ("items", CREATE_ITEMS),
    ("composites", CREATE_COMPOSITES),
    ("composite_links", CREATE_COMPOSITE_LINKS),
    ("projects", CREATE_PROJECTS),
    ("budget_lines", CREATE_BUDGET_LINES),
];

/// 增量列检查: (表, 列, ALTER 语句)
const ADDITIVE_COLUMNS: &[(&str, &str, &str)] = &[
    (
        "projects",
        "markup_pct",
        "ALTER TABLE projects ADD COLUMN markup_pct REAL DEFAULT 25.0",
    ),
    (
        "projects",
        "saved_flag",
        "ALTER TABLE projects ADD COLUMN saved_flag INTEGER DEFAULT 1",
    ),
];

/// 新库建表
pub fn create_schema(conn: &Connection) -> RepositoryResult<()> {
    for (name, ddl) in TABLES {
        conn.execute_batch(ddl)?;
        debug!(table = %name, "建表完成");
    }
    conn.execute_batch(CREATE_COMPOSITE_LINKS_INDEX)?;
    info!("数据库结构初始化完成");
    Ok(())
}

/// 旧库增量迁移,返回实际执行的迁移步数
pub fn run_migrations(conn: &Connection) -> RepositoryResult<usize> {
    let mut applied = 0;

    for (name, ddl) in TABLES {
        let check_sql = format!("SELECT COUNT(*) FROM {}", name);
        if conn.query_row(&check_sql, [], |row| row.get::<_, i64>(0)).is_err() {
            info!(table = %name, "表不存在,执行迁移: 建表");
            conn.execute_batch(ddl)
                .map_err(|e| RepositoryError::MigrationError(format!("{}: {}", name, e)))?;
            applied += 1;
        }
    }

    for (table, column, alter) in ADDITIVE_COLUMNS {
        let check_sql = format!("SELECT {} FROM {} LIMIT 1", column, table);
        if conn.prepare(&check_sql).is_err() {
            info!(table = %table, column = %column, "列不存在,执行迁移: 加列");
            conn.execute_batch(alter).map_err(|e| {
                RepositoryError::MigrationError(format!("{}.{}: {}", table, column, e))
            })?;
            applied += 1;
        }
    }

    conn.execute_batch(CREATE_COMPOSITE_LINKS_INDEX)?;

    if applied > 0 {
        info!(applied = applied, "增量迁移完成");
    }
    Ok(applied)
}

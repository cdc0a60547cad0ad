// ==========================================
// SINAPI 预算系统 - SQLite 连接与存储句柄
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 打开时区分新库（建表）与旧库（增量迁移）
// - 以显式 Store 句柄传递连接,不使用全局连接
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schema;
use crate::repository::{BudgetLineRepository, CatalogRepository, ProjectRepository};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

// ==========================================
// Store - 存储句柄
// ==========================================
// 持有唯一连接; 仓储通过 from_connection 共享,每次调用内加锁
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// 打开（或创建）数据库文件
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let existed = db_path != ":memory:" && Path::new(db_path).exists();

        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;

        if existed {
            schema::run_migrations(&conn)?;
        } else {
            schema::create_schema(&conn)?;
        }

        info!(db_path = %db_path, existed = existed, "数据库已打开");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 内存库（测试用）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        configure_sqlite_connection(&conn)?;
        schema::create_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 共享连接
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::from_connection(self.connection())
    }

    pub fn projects(&self) -> ProjectRepository {
        ProjectRepository::from_connection(self.connection())
    }

    pub fn budget_lines(&self) -> BudgetLineRepository {
        BudgetLineRepository::from_connection(self.connection())
    }
}

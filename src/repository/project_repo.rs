// ==========================================
// SINAPI 预算系统 - 项目仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::budget::{Project, DEFAULT_MARKUP_PCT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建项目,返回新 id
    pub fn create(&self, name: &str, description: &str, markup_pct: f64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = now_timestamp();
        conn.execute(
            r#"
            INSERT INTO projects (name, description, created_on, updated_on, markup_pct, saved_flag)
            VALUES (?1, ?2, ?3, ?3, ?4, 1)
            "#,
            params![name, description, now, markup_pct],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 全部项目,最近更新的在前
    pub fn list(&self) -> RepositoryResult<Vec<Project>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, description, created_on, updated_on, markup_pct, saved_flag
            FROM projects
            ORDER BY updated_on DESC, id DESC
            "#,
        )?;
        let projects = stmt
            .query_map([], map_project)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn find(&self, id: i64) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;
        let project = conn
            .query_row(
                r#"
                SELECT id, name, description, created_on, updated_on, markup_pct, saved_flag
                FROM projects
                WHERE id = ?1
                "#,
                params![id],
                map_project,
            )
            .optional()?;
        Ok(project)
    }

    /// 更新加价百分比
    pub fn update_markup(&self, id: i64, markup_pct: f64) -> RepositoryResult<()> {
        self.execute_on_project(
            id,
            "UPDATE projects SET markup_pct = ?2, updated_on = ?3 WHERE id = ?1",
            markup_pct,
        )
    }

    pub fn set_saved(&self, id: i64, saved: bool) -> RepositoryResult<()> {
        self.execute_on_project(
            id,
            "UPDATE projects SET saved_flag = ?2, updated_on = ?3 WHERE id = ?1",
            saved as i64,
        )
    }

    /// 刷新更新时间
    pub fn touch(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE projects SET updated_on = ?2 WHERE id = ?1",
            params![id, now_timestamp()],
        )?;
        ensure_found(affected, id)
    }

    /// 删除项目（预算行级联删除）
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        ensure_found(affected, id)
    }

    fn execute_on_project<T: rusqlite::ToSql>(
        &self,
        id: i64,
        sql: &str,
        value: T,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(sql, params![id, value, now_timestamp()])?;
        ensure_found(affected, id)
    }
}

fn ensure_found(affected: usize, id: i64) -> RepositoryResult<()> {
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "Project".to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn map_project(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        created_on: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        updated_on: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        markup_pct: row.get::<_, Option<f64>>(5)?.unwrap_or(DEFAULT_MARKUP_PCT),
        saved: row.get::<_, Option<i64>>(6)?.unwrap_or(1) != 0,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::Store;
    use crate::repository::RepositoryError;

    #[test]
    fn test_create_and_find_defaults() {
        let store = Store::open_in_memory().unwrap();
        let repo = store.projects();

        let id = repo.create("Casa Térrea", "Obra residencial", 25.0).unwrap();
        let project = repo.find(id).unwrap().unwrap();

        assert_eq!(project.name, "Casa Térrea");
        assert_eq!(project.markup_pct, 25.0);
        assert!(project.saved);
        assert_eq!(project.created_on, project.updated_on);
    }

    #[test]
    fn test_create_writes_markup() {
        let store = Store::open_in_memory().unwrap();
        let repo = store.projects();
        let id = repo.create("Galpão", "", 30.0).unwrap();
        assert_eq!(repo.find(id).unwrap().unwrap().markup_pct, 30.0);
    }

    #[test]
    fn test_update_markup_and_saved() {
        let store = Store::open_in_memory().unwrap();
        let repo = store.projects();
        let id = repo.create("Galpão", "", 25.0).unwrap();

        repo.update_markup(id, 22.12).unwrap();
        repo.set_saved(id, false).unwrap();

        let project = repo.find(id).unwrap().unwrap();
        assert_eq!(project.markup_pct, 22.12);
        assert!(!project.saved);
    }

    #[test]
    fn test_missing_project_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let repo = store.projects();
        assert!(repo.find(42).unwrap().is_none());
        assert!(matches!(
            repo.update_markup(42, 10.0),
            Err(RepositoryError::NotFound { .. })
        ));
        assert!(matches!(repo.delete(42), Err(RepositoryError::NotFound { .. })));
    }

    #[test]
    fn test_list_orders_by_id_when_timestamps_tie() {
        let store = Store::open_in_memory().unwrap();
        let repo = store.projects();
        let first = repo.create("A", "", 25.0).unwrap();
        let second = repo.create("B", "", 25.0).unwrap();

        let projects = repo.list().unwrap();
        assert_eq!(projects.len(), 2);
        // 同一秒内创建时按 id 倒序,否则 B 的更新时间更晚
        assert_eq!(projects[0].id, second);
        assert_eq!(projects[1].id, first);
    }
}

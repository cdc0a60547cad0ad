// ==========================================
// SINAPI 预算系统 - 预算行仓储
// ==========================================
// 红线: Repository 不含业务逻辑（价格快照由 API 层完成）
// ==========================================

use crate::domain::budget::{BudgetLine, LineKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct BudgetLineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BudgetLineRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入预算行,返回新 id（line.id 被忽略）
    pub fn insert(&self, line: &BudgetLine) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO budget_lines (
                project_id, kind, code, description, unit, quantity, unit_price
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                line.project_id,
                line.kind.to_db_str(),
                line.code,
                line.description,
                line.unit,
                line.quantity,
                line.unit_price,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 项目的全部预算行（按插入顺序）
    pub fn list_by_project(&self, project_id: i64) -> RepositoryResult<Vec<BudgetLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, project_id, kind, code, description, unit, quantity, unit_price
            FROM budget_lines
            WHERE project_id = ?1
            ORDER BY id
            "#,
        )?;
        let lines = stmt
            .query_map(params![project_id], map_line)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    pub fn update_quantity(&self, line_id: i64, quantity: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE budget_lines SET quantity = ?2 WHERE id = ?1",
            params![line_id, quantity],
        )?;
        ensure_found(affected, line_id)
    }

    pub fn delete(&self, line_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM budget_lines WHERE id = ?1", params![line_id])?;
        ensure_found(affected, line_id)
    }

    /// 未加价小计 Σ(数量 × 单价)
    pub fn subtotal(&self, project_id: i64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(quantity * unit_price), 0)
            FROM budget_lines
            WHERE project_id = ?1
            "#,
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}

fn ensure_found(affected: usize, line_id: i64) -> RepositoryResult<()> {
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "BudgetLine".to_string(),
            id: line_id.to_string(),
        });
    }
    Ok(())
}

fn map_line(row: &Row) -> rusqlite::Result<BudgetLine> {
    let raw_kind: String = row.get(2)?;
    let kind = LineKind::from_db_str(&raw_kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("未知的预算行类型: {}", raw_kind).into(),
        )
    })?;

    Ok(BudgetLine {
        id: Some(row.get(0)?),
        project_id: row.get(1)?,
        kind,
        code: row.get(3)?,
        description: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        unit: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        quantity: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
        unit_price: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
    })
}

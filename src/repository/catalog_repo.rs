// ==========================================
// SINAPI 预算系统 - 价格目录仓储
// ==========================================
// 职责: items / composites / composite_links 的读写
// 红线: Repository 不含业务逻辑
// 说明: 导入写入整批在一个事务中提交; 组件关系只追加,不去重
// ==========================================

use crate::domain::catalog::{CatalogEntry, ComponentDetail, ComponentLink, CompositeItem, Item};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// 检索结果上限
pub const SEARCH_LIMIT: i64 = 50;

// ==========================================
// CatalogRepository - 价格目录仓储
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入（导入使用）
    // ==========================================

    /// 批量 upsert 条目（单事务）
    ///
    /// # 返回
    /// - Ok(usize): 写入的行数（含同批次重复编码）
    pub fn write_items(&self, items: &[Item]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let count = Self::upsert_items_tx(&tx, items)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        debug!(count = count, "条目批量写入完成");
        Ok(count)
    }

    /// 批量 upsert 组合并追加组件关系（单事务）
    ///
    /// # 返回
    /// - Ok((组合数, 关系数))
    pub fn write_composites(
        &self,
        composites: &[CompositeItem],
        links: &[ComponentLink],
    ) -> RepositoryResult<(usize, usize)> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let composite_count = Self::upsert_composites_tx(&tx, composites)?;
        let link_count = Self::insert_links_tx(&tx, links)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        debug!(
            composites = composite_count,
            links = link_count,
            "组合批量写入完成"
        );
        Ok((composite_count, link_count))
    }

    fn upsert_items_tx(tx: &Transaction, items: &[Item]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO items (
                code, description, unit, reference_price,
                source, reference_period, updated_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(code) DO UPDATE SET
                description = excluded.description,
                unit = excluded.unit,
                reference_price = excluded.reference_price,
                source = excluded.source,
                reference_period = excluded.reference_period,
                updated_on = excluded.updated_on
            "#,
        )?;

        let mut count = 0;
        for item in items {
            stmt.execute(params![
                item.code,
                item.description,
                item.unit,
                item.reference_price,
                item.source,
                item.reference_period,
                item.updated_on,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    fn upsert_composites_tx(
        tx: &Transaction,
        composites: &[CompositeItem],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO composites (
                code, description, unit, total_cost,
                source, reference_period, updated_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(code) DO UPDATE SET
                description = excluded.description,
                unit = excluded.unit,
                total_cost = excluded.total_cost,
                source = excluded.source,
                reference_period = excluded.reference_period,
                updated_on = excluded.updated_on
            "#,
        )?;

        let mut count = 0;
        for composite in composites {
            stmt.execute(params![
                composite.code,
                composite.description,
                composite.unit,
                composite.total_cost,
                composite.source,
                composite.reference_period,
                composite.updated_on,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    fn insert_links_tx(tx: &Transaction, links: &[ComponentLink]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO composite_links (composite_code, component_code, coefficient)
            VALUES (?1, ?2, ?3)
            "#,
        )?;

        let mut count = 0;
        for link in links {
            stmt.execute(params![link.composite_code, link.component_code, link.coefficient])?;
            count += 1;
        }
        Ok(count)
    }

    /// 删除某组合的全部组件关系
    ///
    /// 导入流程不会调用,需要"整组替换"时由调用方显式执行
    pub fn clear_links(&self, composite_code: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM composite_links WHERE composite_code = ?1",
            params![composite_code],
        )?;
        Ok(deleted)
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 按编码查询条目
    pub fn find_item(&self, code: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        let item = conn
            .query_row(
                r#"
                SELECT code, description, unit, reference_price,
                       source, reference_period, updated_on
                FROM items
                WHERE code = ?1
                "#,
                params![code],
                map_item,
            )
            .optional()?;
        Ok(item)
    }

    /// 按编码查询组合
    pub fn find_composite(&self, code: &str) -> RepositoryResult<Option<CompositeItem>> {
        let conn = self.get_conn()?;
        let composite = conn
            .query_row(
                r#"
                SELECT code, description, unit, total_cost,
                       source, reference_period, updated_on
                FROM composites
                WHERE code = ?1
                "#,
                params![code],
                map_composite,
            )
            .optional()?;
        Ok(composite)
    }

    /// 按描述或编码模糊检索条目
    pub fn search_items(&self, term: &str) -> RepositoryResult<Vec<CatalogEntry>> {
        self.search(
            r#"
            SELECT code, description, unit, reference_price, reference_period
            FROM items
            WHERE description LIKE ?1 OR code LIKE ?1
            ORDER BY description
            LIMIT ?2
            "#,
            term,
        )
    }

    /// 按描述或编码模糊检索组合
    pub fn search_composites(&self, term: &str) -> RepositoryResult<Vec<CatalogEntry>> {
        self.search(
            r#"
            SELECT code, description, unit, total_cost, reference_period
            FROM composites
            WHERE description LIKE ?1 OR code LIKE ?1
            ORDER BY description
            LIMIT ?2
            "#,
            term,
        )
    }

    fn search(&self, sql: &str, term: &str) -> RepositoryResult<Vec<CatalogEntry>> {
        let conn = self.get_conn()?;
        let pattern = format!("%{}%", term.trim());
        let mut stmt = conn.prepare(sql)?;
        let entries = stmt
            .query_map(params![pattern, SEARCH_LIMIT], |row| {
                Ok(CatalogEntry {
                    code: row.get(0)?,
                    description: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    unit: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    price: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                    reference_period: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// 列出组合的组件明细
    ///
    /// 组件先在 items 中查找,找不到再回退到 composites
    pub fn list_components(&self, composite_code: &str) -> RepositoryResult<Vec<ComponentDetail>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                l.component_code,
                COALESCE(i.description, c.description),
                COALESCE(i.unit, c.unit),
                l.coefficient,
                COALESCE(i.reference_price, c.total_cost)
            FROM composite_links l
            LEFT JOIN items i ON l.component_code = i.code
            LEFT JOIN composites c ON l.component_code = c.code
            WHERE l.composite_code = ?1
            ORDER BY l.id
            "#,
        )?;

        let details = stmt
            .query_map(params![composite_code], |row| {
                Ok(ComponentDetail {
                    component_code: row.get(0)?,
                    description: row.get(1)?,
                    unit: row.get(2)?,
                    coefficient: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                    unit_price: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(details)
    }

    // ==========================================
    // 统计
    // ==========================================

    pub fn count_items(&self) -> RepositoryResult<usize> {
        self.count("SELECT COUNT(*) FROM items")
    }

    pub fn count_composites(&self) -> RepositoryResult<usize> {
        self.count("SELECT COUNT(*) FROM composites")
    }

    pub fn count_links(&self) -> RepositoryResult<usize> {
        self.count("SELECT COUNT(*) FROM composite_links")
    }

    fn count(&self, sql: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn map_item(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        code: row.get(0)?,
        description: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        unit: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        reference_price: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
        source: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        reference_period: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        updated_on: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

fn map_composite(row: &Row) -> rusqlite::Result<CompositeItem> {
    Ok(CompositeItem {
        code: row.get(0)?,
        description: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        unit: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        total_cost: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
        source: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        reference_period: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        updated_on: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

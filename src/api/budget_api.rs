// ==========================================
// SINAPI 预算系统 - 预算API
// ==========================================
// 职责: 项目与预算行的业务操作
// 红线: 预算行写入时快照描述/单位/单价,之后目录重新导入不回写
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::db::Store;
use crate::domain::budget::{BudgetLine, BudgetSummary, LineKind, Project, DEFAULT_MARKUP_PCT};
use crate::domain::catalog::{CatalogEntry, ComponentDetail};
use crate::repository::{BudgetLineRepository, CatalogRepository, ProjectRepository};
use tracing::{debug, info, instrument};

pub struct BudgetApi {
    catalog: CatalogRepository,
    projects: ProjectRepository,
    lines: BudgetLineRepository,
    default_markup_pct: f64,
}

impl BudgetApi {
    pub fn new(store: &Store) -> Self {
        Self {
            catalog: store.catalog(),
            projects: store.projects(),
            lines: store.budget_lines(),
            default_markup_pct: DEFAULT_MARKUP_PCT,
        }
    }

    /// 新项目使用的加价百分比
    pub fn with_default_markup(mut self, markup_pct: f64) -> Self {
        self.default_markup_pct = markup_pct;
        self
    }

    // ==========================================
    // 项目
    // ==========================================

    pub fn create_project(&self, name: &str, description: &str) -> ApiResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("项目名称不能为空".to_string()));
        }
        validate_markup(self.default_markup_pct)?;

        let id = self
            .projects
            .create(name, description.trim(), self.default_markup_pct)?;
        info!(project_id = id, name = %name, "项目已创建");
        self.get_project(id)
    }

    pub fn list_projects(&self) -> ApiResult<Vec<Project>> {
        Ok(self.projects.list()?)
    }

    pub fn get_project(&self, project_id: i64) -> ApiResult<Project> {
        self.projects
            .find(project_id)?
            .ok_or_else(|| ApiError::NotFound(format!("项目(id={})不存在", project_id)))
    }

    pub fn set_markup(&self, project_id: i64, markup_pct: f64) -> ApiResult<Project> {
        validate_markup(markup_pct)?;
        self.projects.update_markup(project_id, markup_pct)?;
        info!(project_id = project_id, markup_pct = markup_pct, "加价百分比已更新");
        self.get_project(project_id)
    }

    pub fn mark_saved(&self, project_id: i64, saved: bool) -> ApiResult<()> {
        self.projects.set_saved(project_id, saved)?;
        Ok(())
    }

    pub fn delete_project(&self, project_id: i64) -> ApiResult<()> {
        self.projects.delete(project_id)?;
        info!(project_id = project_id, "项目已删除");
        Ok(())
    }

    // ==========================================
    // 预算行
    // ==========================================

    /// 添加预算行
    ///
    /// # 校验
    /// - 项目存在
    /// - 数量有限且非负
    /// - 目录中存在对应编码（按 kind 查 items 或 composites）
    #[instrument(skip(self))]
    pub fn add_line(
        &self,
        project_id: i64,
        kind: LineKind,
        code: &str,
        quantity: f64,
    ) -> ApiResult<BudgetLine> {
        validate_quantity(quantity)?;
        self.get_project(project_id)?;

        let code = code.trim();
        let entry: CatalogEntry = match kind {
            LineKind::Item => self.catalog.find_item(code)?.map(CatalogEntry::from),
            LineKind::Composite => self.catalog.find_composite(code)?.map(CatalogEntry::from),
        }
        .ok_or_else(|| ApiError::NotFound(format!("{}(code={})不存在", kind, code)))?;

        let mut line = BudgetLine {
            id: None,
            project_id,
            kind,
            code: entry.code,
            description: entry.description,
            unit: entry.unit,
            quantity,
            unit_price: entry.price,
        };
        line.id = Some(self.lines.insert(&line)?);
        self.projects.touch(project_id)?;

        debug!(line_id = ?line.id, total = line.total(), "预算行已添加");
        Ok(line)
    }

    pub fn list_lines(&self, project_id: i64) -> ApiResult<Vec<BudgetLine>> {
        Ok(self.lines.list_by_project(project_id)?)
    }

    pub fn update_line_quantity(&self, line_id: i64, quantity: f64) -> ApiResult<()> {
        validate_quantity(quantity)?;
        self.lines.update_quantity(line_id, quantity)?;
        Ok(())
    }

    pub fn remove_line(&self, line_id: i64) -> ApiResult<()> {
        self.lines.delete(line_id)?;
        Ok(())
    }

    /// 预算汇总（使用项目当前加价百分比）
    pub fn summary(&self, project_id: i64) -> ApiResult<BudgetSummary> {
        let project = self.get_project(project_id)?;
        let line_count = self.lines.list_by_project(project_id)?.len();
        let subtotal = self.lines.subtotal(project_id)?;
        Ok(BudgetSummary::compute(
            project_id,
            line_count,
            subtotal,
            project.markup_pct,
        ))
    }

    // ==========================================
    // 目录查询
    // ==========================================

    pub fn search_catalog(&self, kind: LineKind, term: &str) -> ApiResult<Vec<CatalogEntry>> {
        let entries = match kind {
            LineKind::Item => self.catalog.search_items(term.trim())?,
            LineKind::Composite => self.catalog.search_composites(term.trim())?,
        };
        Ok(entries)
    }

    pub fn components(&self, composite_code: &str) -> ApiResult<Vec<ComponentDetail>> {
        Ok(self.catalog.list_components(composite_code.trim())?)
    }
}

fn validate_quantity(quantity: f64) -> ApiResult<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(ApiError::InvalidInput(format!("数量非法: {}", quantity)));
    }
    Ok(())
}

fn validate_markup(markup_pct: f64) -> ApiResult<()> {
    if !markup_pct.is_finite() || markup_pct < 0.0 {
        return Err(ApiError::InvalidInput(format!("加价百分比非法: {}", markup_pct)));
    }
    Ok(())
}

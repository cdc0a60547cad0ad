// ==========================================
// SINAPI 预算系统 - 命令行入口
// ==========================================
// 输出: 结果以 JSON 打印到 stdout,日志写 stderr
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sinapi_budget::config::AppConfig;
use sinapi_budget::domain::LineKind;
use sinapi_budget::importer::ImportKind;
use sinapi_budget::{logging, BudgetApi, ImportApi, Store};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sinapi-budget")]
#[command(version, about = "SINAPI 价格表导入与工程预算", long_about = None)]
struct Cli {
    /// 数据库文件路径（覆盖配置与环境变量）
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Item,
    Composite,
}

impl From<KindArg> for LineKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Item => LineKind::Item,
            KindArg::Composite => LineKind::Composite,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// 导入单价条目表（insumos）
    ImportItems {
        file: PathBuf,
        /// 工作表名（缺省时按配置依次猜测）
        #[arg(long)]
        sheet: Option<String>,
        /// 参考期 YYYY-MM（缺省为当前年月）
        #[arg(long)]
        period: Option<String>,
    },

    /// 导入组合表（composições）
    ImportComposites {
        file: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        period: Option<String>,
    },

    /// 按编码或描述检索目录
    Search {
        term: String,
        #[arg(long, value_enum, default_value = "item")]
        kind: KindArg,
    },

    /// 列出组合的组件明细
    Components { code: String },

    /// 新建项目
    ProjectNew {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// 列出全部项目
    ProjectList,

    /// 添加预算行
    AddLine {
        project: i64,
        code: String,
        quantity: f64,
        #[arg(long, value_enum, default_value = "item")]
        kind: KindArg,
    },

    /// 设置项目加价百分比
    SetMarkup { project: i64, pct: f64 },

    /// 预算汇总
    Summary { project: i64 },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;
    if let Some(db) = &cli.db {
        config.db_path = Some(db.to_string_lossy().to_string());
    }

    logging::init_with(config.log_format);
    tracing::info!(version = sinapi_budget::VERSION, "{}", sinapi_budget::APP_NAME);

    let db_path = config.resolved_db_path();
    tracing::info!(db_path = %db_path, "使用数据库");
    let store = Store::open(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;

    let budget = BudgetApi::new(&store).with_default_markup(config.default_markup_pct);

    match cli.command {
        Commands::ImportItems {
            file,
            sheet,
            period,
        } => {
            let api = ImportApi::new(&store, config.import.clone());
            let report = match sheet {
                Some(sheet) => api.import_sheet(ImportKind::Items, &file, &sheet, period.as_deref())?,
                None => api.import_items(&file, period.as_deref())?,
            };
            print_json(&report)?;
        }
        Commands::ImportComposites {
            file,
            sheet,
            period,
        } => {
            let api = ImportApi::new(&store, config.import.clone());
            let report = match sheet {
                Some(sheet) => {
                    api.import_sheet(ImportKind::Composites, &file, &sheet, period.as_deref())?
                }
                None => api.import_composites(&file, period.as_deref())?,
            };
            print_json(&report)?;
        }
        Commands::Search { term, kind } => {
            print_json(&budget.search_catalog(kind.into(), &term)?)?;
        }
        Commands::Components { code } => {
            print_json(&budget.components(&code)?)?;
        }
        Commands::ProjectNew { name, description } => {
            print_json(&budget.create_project(&name, &description)?)?;
        }
        Commands::ProjectList => {
            print_json(&budget.list_projects()?)?;
        }
        Commands::AddLine {
            project,
            code,
            quantity,
            kind,
        } => {
            print_json(&budget.add_line(project, kind.into(), &code, quantity)?)?;
        }
        Commands::SetMarkup { project, pct } => {
            print_json(&budget.set_markup(project, pct)?)?;
        }
        Commands::Summary { project } => {
            print_json(&budget.summary(project)?)?;
        }
    }

    Ok(())
}

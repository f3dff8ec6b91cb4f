use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal_macros::dec;
use serde::Serialize;

use gasto_publico::{
    commands::{
        departments::CreateDepartmentCommand,
        purchases::{CreatePurchaseCommand, NewLineItem},
        suppliers::CreateSupplierCommand,
    },
    common::{DepartmentRankingParams, PeriodParams, SupplierRankingParams},
    config::{self, AppConfig},
    db::{self, DbPool},
    queries::{Period, PurchaseFilter},
    AppState,
};

#[derive(Parser)]
#[command(
    name = "gasto-publico-cli",
    version,
    about = "Operator commands for the public-spending database"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Total spend in a period
    Total(PeriodArgs),
    /// Suppliers ranked by the amount purchased from them
    Suppliers(RankingArgs),
    /// Departments ranked by what they spent
    Departments(RankingArgs),
    /// Full-text search over purchases
    Search(SearchArgs),
    /// Rebuild every search vector
    Reindex,
    /// Load a small demo dataset dated in the current month
    Seed,
}

#[derive(Args)]
struct PeriodArgs {
    /// First day included (YYYY-MM-DD); defaults to the first of this month
    #[arg(long)]
    desde: Option<String>,
    /// Last day included (YYYY-MM-DD); defaults to today
    #[arg(long)]
    hasta: Option<String>,
}

impl PeriodArgs {
    fn period(&self) -> Result<Period> {
        Ok(PeriodParams {
            desde: self.desde.clone(),
            hasta: self.hasta.clone(),
        }
        .period()?)
    }
}

#[derive(Args)]
struct RankingArgs {
    #[command(flatten)]
    period: PeriodArgs,
    /// Restrict to purchases of this department or supplier (slug)
    #[arg(long = "of")]
    of: Option<String>,
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Args)]
struct SearchArgs {
    /// Query in to_tsquery syntax, e.g. "insumos & medicos"
    query: String,
    #[arg(long)]
    limit: Option<u64>,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        Ok(Self {
            config,
            db: Arc::new(db_pool),
        })
    }

    fn state(&self) -> AppState {
        AppState::new(self.db.clone(), self.config.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::Total(args) => handle_total(&context, args, cli.json).await?,
        Commands::Suppliers(args) => handle_suppliers(&context, args, cli.json).await?,
        Commands::Departments(args) => handle_departments(&context, args, cli.json).await?,
        Commands::Search(args) => handle_search(&context, args, cli.json).await?,
        Commands::Reindex => {
            let report = context
                .state()
                .services
                .catalog
                .reindex()
                .await
                .context("failed to rebuild the search index")?;
            if cli.json {
                print_json(&report)?;
            } else {
                println!(
                    "Reindexed {} suppliers, {} departments, {} line items",
                    report.suppliers, report.departments, report.line_items
                );
            }
        }
        Commands::Seed => handle_seed(&context).await?,
    }

    Ok(())
}

async fn handle_total(context: &CliContext, args: PeriodArgs, json: bool) -> Result<()> {
    let period = args.period()?;
    let total = context
        .state()
        .services
        .reports
        .total_for_period(period, PurchaseFilter::new())
        .await?;
    if json {
        print_json(&serde_json::json!({ "period": period, "total": total }))?;
    } else {
        println!("{} .. {}: ${}", period.start, period.end, total);
    }
    Ok(())
}

async fn handle_suppliers(context: &CliContext, args: RankingArgs, json: bool) -> Result<()> {
    let params = SupplierRankingParams {
        desde: args.period.desde,
        hasta: args.period.hasta,
        department: args.of,
        limit: args.limit,
    };
    let ranking = context
        .state()
        .services
        .reports
        .supplier_ranking(params.period()?, params.filter(), params.limit)
        .await?;
    if json {
        return print_json(&ranking);
    }
    if ranking.is_empty() {
        println!("No purchases in period");
    }
    for (pos, row) in ranking.iter().enumerate() {
        println!("{:>3}. {:<48} ${}", pos + 1, row.supplier.name, row.total);
    }
    Ok(())
}

async fn handle_departments(context: &CliContext, args: RankingArgs, json: bool) -> Result<()> {
    let params = DepartmentRankingParams {
        desde: args.period.desde,
        hasta: args.period.hasta,
        supplier: args.of,
        limit: args.limit,
    };
    let ranking = context
        .state()
        .services
        .reports
        .department_ranking(params.period()?, params.filter(), params.limit)
        .await?;
    if json {
        return print_json(&ranking);
    }
    if ranking.is_empty() {
        println!("No purchases in period");
    }
    for (pos, row) in ranking.iter().enumerate() {
        println!("{:>3}. {:<48} ${}", pos + 1, row.department.name, row.total);
    }
    Ok(())
}

async fn handle_search(context: &CliContext, args: SearchArgs, json: bool) -> Result<()> {
    let hits = context
        .state()
        .services
        .reports
        .search(&args.query, args.limit)
        .await?;
    if json {
        return print_json(&hits);
    }
    if hits.is_empty() {
        println!("No matches");
    }
    for hit in &hits {
        println!(
            "- OC {:<12} {:>8.4}  ${}",
            hit.purchase.order_code().unwrap_or_else(|| "s/n".into()),
            hit.rank,
            hit.purchase.amount
        );
    }
    Ok(())
}

async fn handle_seed(context: &CliContext) -> Result<()> {
    let catalog = context.state().services.catalog;
    let today = Local::now().date_naive();
    let day = |d: u32| NaiveDate::from_ymd_opt(today.year(), today.month(), d.min(today.day()));

    let acme = catalog
        .create_supplier(CreateSupplierCommand {
            address: Some("Av. Pellegrini 1234".into()),
            locality: Some("Rosario".into()),
            ..CreateSupplierCommand::named("ACME S.A.")
        })
        .await?;
    let papelera = catalog
        .create_supplier(CreateSupplierCommand::named("Papelera del Litoral"))
        .await?;
    let salud = catalog
        .create_department(CreateDepartmentCommand::named("Secretaría de Salud Pública"))
        .await?;
    let obras = catalog
        .create_department(CreateDepartmentCommand::named("Secretaría de Obras Públicas"))
        .await?;

    let purchases = [
        CreatePurchaseCommand::new(acme.id, salud.id, dec!(1000.00))
            .with_line_item(NewLineItem::new("compra de insumos médicos", dec!(250.00)))
            .with_line_item(NewLineItem::new("guantes de látex", dec!(750.00))),
        CreatePurchaseCommand::new(acme.id, obras.id, dec!(500.00))
            .with_line_item(NewLineItem::new("cemento portland", dec!(500.00))),
        CreatePurchaseCommand::new(papelera.id, salud.id, dec!(120.50))
            .with_line_item(NewLineItem::new("resmas de papel A4", dec!(120.50))),
    ];

    for (n, command) in purchases.into_iter().enumerate() {
        let number = 1000 + n as i32;
        let date = day(1 + 7 * n as u32).context("invalid seed date")?;
        let saved = catalog.create_purchase(command.with_order(number, date)).await?;
        println!("Created purchase {}", saved.order_code().unwrap_or_default());
    }
    println!("Seed data loaded");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

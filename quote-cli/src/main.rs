use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use quote_core::calculations::estimators::estimate_drilling;
use quote_core::{LookupPolicy, QuoteRepository};
use rust_decimal::Decimal;
use tracing::{debug, info};

use quote_cli::app;
use quote_cli::config::{AppConfig, Language, Overrides};
use quote_cli::job::{DrillInput, DrillMode, JobFile, RawValue, wire_edm_method};
use quote_cli::logging::{enable_file_logging, init_logging, set_log_level};
use quote_cli::summary::{Labels, QuoteSummary};
use quote_cli::utils::{format_money, parse_amount, parse_order_item};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Machine-shop quoting: machine rates, materials, cycle-time estimates,
/// quotes and sales orders.
#[derive(Debug, Parser)]
#[command(name = "shop-quote", version)]
struct Cli {
    /// Configuration file. Defaults to `./shop-quote.toml` when present.
    #[arg(long, global = true, env = "SHOP_QUOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Store backend.
    #[arg(long, global = true, env = "SHOP_QUOTE_BACKEND")]
    backend: Option<String>,

    /// Store connection string. For SQLite a file path or `:memory:`.
    #[arg(long, global = true, env = "SHOP_QUOTE_DB")]
    db: Option<String>,

    /// Log filter, e.g. `debug` or `quote_core=debug`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Currency label printed after amounts.
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Language for summaries and exported quotes.
    #[arg(long, global = true, value_enum)]
    language: Option<Language>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Price a job file and print the breakdown.
    Price {
        /// Job description in TOML.
        #[arg(long)]
        job: PathBuf,

        /// Also write an HTML quote document here.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Fail on unknown machines or materials instead of pricing them at 0.
        #[arg(long)]
        strict: bool,
    },

    /// Estimate drilling cycle time.
    Drill(DrillArgs),

    /// Estimate wire-EDM hours from hours or cut area.
    WireEdm(WireEdmArgs),

    /// Machine rates, area rate and profit margin.
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Material unit costs.
    #[command(subcommand)]
    Materials(MaterialsCommand),

    #[command(subcommand)]
    Customers(CustomersCommand),

    #[command(subcommand)]
    Products(ProductsCommand),

    /// Create a confirmed sales order.
    SalesOrder {
        #[arg(long)]
        customer: i64,

        /// `<product_id>:<quantity>`, repeatable.
        #[arg(long = "item", required = true, value_parser = parse_order_item)]
        items: Vec<(i64, i64)>,
    },
}

#[derive(Debug, Args)]
struct DrillArgs {
    #[arg(long, value_enum, default_value_t = DrillMode::Simple)]
    mode: DrillMode,

    /// Hole depth, mm.
    #[arg(long)]
    depth: String,

    /// Feed rate, mm/min.
    #[arg(long)]
    feed: String,

    /// Rapid rate, mm/min. Required for peck drilling.
    #[arg(long)]
    rapid: Option<String>,

    #[arg(long)]
    holes: Option<String>,

    /// Dwell at the bottom, ms.
    #[arg(long)]
    dwell_ms: Option<String>,

    /// Peck depth, mm.
    #[arg(long)]
    peck: Option<String>,
}

#[derive(Debug, Args)]
struct WireEdmArgs {
    #[arg(long, conflicts_with_all = ["length", "thickness"])]
    hours: Option<String>,

    /// Cut length, mm.
    #[arg(long, requires = "thickness")]
    length: Option<String>,

    /// Part thickness, mm.
    #[arg(long, requires = "length")]
    thickness: Option<String>,
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    Show,
    /// Set a machine rate, `profit_margin` or `Wire EDM_sqmm`.
    Set {
        key: String,
        #[arg(value_parser = parse_amount)]
        value: Decimal,
    },
}

#[derive(Debug, Subcommand)]
enum MaterialsCommand {
    List,
    /// Add a material that does not exist yet.
    Add {
        name: String,
        #[arg(value_parser = parse_amount)]
        cost: Decimal,
    },
    /// Create or update a material.
    Set {
        name: String,
        #[arg(value_parser = parse_amount)]
        cost: Decimal,
    },
    Delete {
        name: String,
    },
}

#[derive(Debug, Subcommand)]
enum CustomersCommand {
    List,
    Add { name: String },
}

#[derive(Debug, Subcommand)]
enum ProductsCommand {
    List,
    Add {
        name: String,
        #[arg(value_parser = parse_amount)]
        unit_price: Decimal,
    },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging("info");

    let config = AppConfig::load(cli.config.as_deref())?.apply(Overrides {
        backend: cli.backend,
        db: cli.db,
        log_level: cli.log_level,
        log_file: cli.log_file,
        currency: cli.currency,
        language: cli.language,
    });

    if std::env::var_os("RUST_LOG").is_none() {
        set_log_level(&config.logging.level).context("Failed to apply logging.level")?;
    }
    if let Some(path) = &config.logging.file {
        enable_file_logging(path)?;
    }
    debug!(?config, "configuration resolved");

    match cli.command {
        Command::Drill(args) => run_drill(&args),
        command => {
            let repo = app::open_store(&config).await?;
            run(&*repo, &config, command).await
        }
    }
}

fn run_drill(args: &DrillArgs) -> Result<()> {
    let input = DrillInput {
        mode: args.mode,
        depth: args.depth.clone(),
        feed_rate: args.feed.clone(),
        rapid_rate: args.rapid.clone(),
        hole_count: args.holes.clone(),
        dwell_ms: args.dwell_ms.clone(),
        peck_depth: args.peck.clone(),
    };
    let params = input.to_params()?;
    let estimate = estimate_drilling(&params)?;

    println!("{}", params.describe());
    print!("{}", app::describe_drilling(&estimate));
    Ok(())
}

async fn run(
    repo: &dyn QuoteRepository,
    config: &AppConfig,
    command: Command,
) -> Result<()> {
    let currency = config.display.currency.as_str();

    match command {
        Command::Price {
            job,
            export,
            strict,
        } => {
            let job_file = JobFile::load(&job)?;
            let policy = if strict {
                LookupPolicy::Strict
            } else {
                LookupPolicy::Lenient
            };
            let priced = app::price_job(repo, &job_file, policy)
                .await
                .with_context(|| format!("Failed to price '{}'", job.display()))?;

            let summary = QuoteSummary {
                quote: &priced.quote,
                breakdown: &priced.breakdown,
                labels: Labels::for_language(config.display.language),
                currency,
            };
            print!("{summary}");

            if let Some(path) = export {
                let document =
                    app::export_quote(&priced, &config.display, &path, Local::now().naive_local())?;
                println!("\n{} -> {}", document.quote_id, path.display());
            }
        }
        Command::Drill(args) => run_drill(&args)?,
        Command::WireEdm(args) => {
            let text = |value: &Option<String>| value.clone().map(RawValue::Text);
            let method = wire_edm_method(
                text(&args.hours).as_ref(),
                text(&args.length).as_ref(),
                text(&args.thickness).as_ref(),
            )?;
            let estimate = app::estimate_wire_edm(repo, method).await?;

            println!("{}", method.describe());
            println!("hours {}", estimate.hours);
            if let Some(cost) = estimate.cost {
                println!("cost  {} {currency}", format_money(cost));
            }
        }
        Command::Settings(SettingsCommand::Show) => print!("{}", app::show_settings(repo).await?),
        Command::Settings(SettingsCommand::Set { key, value }) => {
            app::set_setting(repo, &key, value).await?
        }
        Command::Materials(MaterialsCommand::List) => print!("{}", app::list_materials(repo).await?),
        Command::Materials(MaterialsCommand::Add { name, cost }) => {
            app::add_material(repo, &name, cost).await?
        }
        Command::Materials(MaterialsCommand::Set { name, cost }) => {
            app::set_material(repo, &name, cost).await?
        }
        Command::Materials(MaterialsCommand::Delete { name }) => {
            app::delete_material(repo, &name).await?
        }
        Command::Customers(CustomersCommand::List) => {
            for customer in repo.list_customers().await? {
                println!("{:>5}  {}", customer.id, customer.name);
            }
        }
        Command::Customers(CustomersCommand::Add { name }) => {
            let customer = repo.add_customer(name.trim()).await?;
            println!("{:>5}  {}", customer.id, customer.name);
        }
        Command::Products(ProductsCommand::List) => {
            for product in repo.list_products().await? {
                println!(
                    "{:>5}  {:<32}{:>12}",
                    product.id,
                    product.name,
                    format_money(product.unit_price)
                );
            }
        }
        Command::Products(ProductsCommand::Add { name, unit_price }) => {
            anyhow::ensure!(unit_price >= Decimal::ZERO, "unit price must be >= 0");
            let product = repo.add_product(name.trim(), unit_price).await?;
            println!("{:>5}  {}", product.id, product.name);
        }
        Command::SalesOrder { customer, items } => {
            let order = app::create_sales_order(
                repo,
                customer,
                &items,
                Local::now().date_naive(),
            )
            .await?;
            print!("{}", app::describe_sales_order(&order, currency));
        }
    }

    info!("done");
    Ok(())
}

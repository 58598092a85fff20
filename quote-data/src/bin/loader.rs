use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use quote_data::MaterialLoader;
use quote_db_sqlite::SqliteRepository;

/// Load a material price list (CSV with `name,cost` columns) into the
/// quoting database. Existing materials with the same name are updated.
#[derive(Parser, Debug)]
#[command(name = "quote-material-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV price list
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL; created if missing
    #[arg(short, long, default_value = "shop_quotes.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database).await?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations().await?;
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir).await?;
    }

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = MaterialLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} materials from {}", records.len(), args.file.display());

    let loaded = MaterialLoader::load(&repo, &records)
        .await
        .context("Failed to load materials into database")?;

    println!("Loaded {loaded} materials into {}.", args.database);

    Ok(())
}

//! Job files priced against a seeded in-memory store.

use std::path::Path;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use quote_cli::app::{export_quote, price_job};
use quote_cli::config::{DisplayConfig, Language};
use quote_cli::job::JobFile;
use quote_core::{LookupPolicy, PricingMethod};
use quote_db_sqlite::SqliteRepository;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

const JOB: &str = include_str!("fixtures/job.toml");

async fn setup_seeded_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");
    repo.run_seeds(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../quote-db-sqlite/seeds")))
        .await
        .expect("Failed to run seeds");
    repo
}

#[tokio::test]
async fn test_price_fixture_job() {
    let repo = setup_seeded_db().await;
    let job = JobFile::from_toml(JOB).unwrap();

    let priced = price_job(&repo, &job, LookupPolicy::Lenient).await.unwrap();

    let costs: Vec<Decimal> = priced.quote.operations.iter().map(|op| op.cost_per_unit).collect();
    assert_eq!(costs, vec![dec!(1100), dec!(150), dec!(12), dec!(1200)]);
    assert_eq!(priced.quote.operations.operations()[3].method, PricingMethod::Time);

    let b = &priced.breakdown;
    assert_eq!(b.material_cost_per_unit, dec!(80));
    assert_eq!(b.total_labor_cost_per_unit, dec!(2462));
    assert_eq!(b.sub_total, dec!(5084));
    assert_eq!(b.profit, dec!(1271));
    assert_eq!(b.final_price, dec!(6355));
    assert_eq!(b.price_per_unit, dec!(3177.5));
    assert!(b.lookup_misses.is_empty());
}

#[tokio::test]
async fn test_unknown_material_lenient_and_strict() {
    let repo = setup_seeded_db().await;
    let job = JobFile::from_toml("material = \"Titanium Gr5\"\nquantity = 1").unwrap();

    let lenient = price_job(&repo, &job, LookupPolicy::Lenient).await.unwrap();
    let strict = price_job(&repo, &job, LookupPolicy::Strict).await;

    assert_eq!(lenient.breakdown.final_price, Decimal::ZERO);
    assert_eq!(lenient.breakdown.lookup_misses.len(), 1);
    assert!(strict.is_err());
}

#[tokio::test]
async fn test_export_fixture_job_to_html() {
    let repo = setup_seeded_db().await;
    let job = JobFile::from_toml(JOB).unwrap();
    let priced = price_job(&repo, &job, LookupPolicy::Lenient).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quote.html");
    let issued_at = NaiveDate::from_ymd_opt(2025, 3, 7)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let display = DisplayConfig {
        currency: "THB".to_string(),
        language: Language::En,
    };

    let document = export_quote(&priced, &display, &path, issued_at).unwrap();

    assert_eq!(document.quote_id, "QT-20250307-0930");
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("QT-20250307-0930"));
    assert!(html.contains("6,355.00 THB"));
    assert!(html.contains("G81 x4 depth 30 feed 100"));
    assert!(html.contains("Delivery within 10 working days."));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

//! Store-backed operations behind each `shop-quote` command.
//!
//! Everything here returns data or printable text; `main` only parses
//! arguments and prints.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use chrono::{NaiveDate, NaiveDateTime};
use quote_core::calculations::estimators::{
    DrillingEstimate, WireEdmEstimate, WireEdmEstimator, WireEdmMethod,
};
use quote_core::db::RepositoryRegistry;
use quote_core::{
    Breakdown, LookupPolicy, Quote, QuoteDocument, QuoteExporter, QuoteRepository, RateTable,
    SalesOrder, SalesOrderDraft, PROFIT_MARGIN_KEY, WIRE_EDM_AREA_RATE_KEY, price,
};
use quote_db_sqlite::SqliteRepositoryFactory;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::{AppConfig, DisplayConfig};
use crate::export::HtmlQuoteExporter;
use crate::job::JobFile;
use crate::utils::format_money;

/// Registry with every backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

pub async fn open_store(config: &AppConfig) -> Result<Box<dyn QuoteRepository>> {
    let db_config = config.db_config();
    debug!("connecting to {} backend", db_config.backend);
    build_registry()
        .create(&db_config)
        .await
        .with_context(|| format!("Failed to open store '{}'", db_config.connection_string))
}

/// A quote together with its breakdown.
#[derive(Debug, Clone)]
pub struct PricedQuote {
    pub quote: Quote,
    pub breakdown: Breakdown,
}

/// Loads the session snapshot, builds the quote from `job` and prices it.
pub async fn price_job(
    repo: &dyn QuoteRepository,
    job: &JobFile,
    policy: LookupPolicy,
) -> Result<PricedQuote> {
    let (rates, materials) = repo
        .load_snapshot()
        .await
        .context("Failed to load rates and materials")?;
    info!(
        machines = rates.hourly_rates.len(),
        materials = materials.len(),
        "session snapshot loaded"
    );

    let quote = job.build_quote(&rates, &materials, policy)?;
    let breakdown = price(&quote, &rates, &materials)?;
    Ok(PricedQuote { quote, breakdown })
}

pub fn export_quote(
    priced: &PricedQuote,
    display: &DisplayConfig,
    path: &Path,
    issued_at: NaiveDateTime,
) -> Result<QuoteDocument> {
    let document = QuoteDocument::from_quote(&priced.quote, &priced.breakdown, issued_at);
    let exporter = HtmlQuoteExporter::new(display.language, display.currency.as_str())?;
    exporter
        .export(&document, path)
        .with_context(|| format!("Failed to export quote to '{}'", path.display()))?;
    Ok(document)
}

pub fn describe_drilling(estimate: &DrillingEstimate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "feed time / hole   {} min", estimate.feed_time_per_hole);
    if !estimate.dwell_time_per_hole.is_zero() {
        let _ = writeln!(out, "dwell time / hole  {} min", estimate.dwell_time_per_hole);
    }
    if estimate.peck_count > 1 {
        let _ = writeln!(
            out,
            "pecks              {} (last {} mm)",
            estimate.peck_count, estimate.last_peck
        );
        let _ = writeln!(out, "rapid distance     {} mm", estimate.rapid_distance);
        let _ = writeln!(out, "rapid time / hole  {} min", estimate.rapid_time_per_hole);
    }
    let _ = writeln!(out, "total              {} min", estimate.total_minutes);
    out
}

/// Runs the wire-EDM estimator with the stored `Wire EDM` rate and area
/// rate.
pub async fn estimate_wire_edm(
    repo: &dyn QuoteRepository,
    method: WireEdmMethod,
) -> Result<WireEdmEstimate> {
    let settings = repo.get_settings().await?;
    let rates = RateTable::from_settings(&settings);
    Ok(WireEdmEstimator::from_rates(&rates).estimate(method)?)
}

pub async fn show_settings(repo: &dyn QuoteRepository) -> Result<String> {
    let rates = RateTable::from_settings(&repo.get_settings().await?);

    let mut out = String::new();
    for (machine, rate) in &rates.hourly_rates {
        let _ = writeln!(out, "{machine:<24}{:>12} / h", format_money(*rate));
    }
    let _ = writeln!(out, "{WIRE_EDM_AREA_RATE_KEY:<24}{:>12}", rates.wire_edm_area_rate);
    let _ = writeln!(out, "{PROFIT_MARGIN_KEY:<24}{:>12}", rates.profit_margin);
    Ok(out)
}

/// Stores one setting. Any key other than `profit_margin` and
/// `Wire EDM_sqmm` is a machine rate.
pub async fn set_setting(
    repo: &dyn QuoteRepository,
    key: &str,
    value: Decimal,
) -> Result<()> {
    let key = key.trim();
    ensure!(!key.is_empty(), "setting name must not be empty");
    ensure!(value >= Decimal::ZERO, "'{key}' must be >= 0");

    let settings = HashMap::from([(key.to_string(), value)]);
    repo.update_settings(&settings).await?;
    info!(key, value = %value, "setting saved");
    Ok(())
}

pub async fn list_materials(repo: &dyn QuoteRepository) -> Result<String> {
    let materials = repo.get_all_materials().await?;

    let mut out = String::new();
    for (name, cost) in &materials {
        let _ = writeln!(out, "{name:<40}{:>12}", format_money(*cost));
    }
    Ok(out)
}

/// Adds a new material; fails when the name is already taken.
pub async fn add_material(
    repo: &dyn QuoteRepository,
    name: &str,
    cost: Decimal,
) -> Result<()> {
    let name = validate_material(name, cost)?;
    if !repo.add_material(name, cost).await? {
        bail!("material '{name}' already exists");
    }
    info!(name, cost = %cost, "material added");
    Ok(())
}

/// Creates or updates a material's unit cost.
pub async fn set_material(
    repo: &dyn QuoteRepository,
    name: &str,
    cost: Decimal,
) -> Result<()> {
    let name = validate_material(name, cost)?;
    let materials = BTreeMap::from([(name.to_string(), cost)]);
    repo.update_materials(&materials).await?;
    info!(name, cost = %cost, "material saved");
    Ok(())
}

pub async fn delete_material(
    repo: &dyn QuoteRepository,
    name: &str,
) -> Result<()> {
    repo.delete_material(name.trim()).await?;
    info!(name, "material deleted");
    Ok(())
}

fn validate_material(
    name: &str,
    cost: Decimal,
) -> Result<&str> {
    let name = name.trim();
    ensure!(!name.is_empty(), "material name must not be empty");
    ensure!(cost >= Decimal::ZERO, "material cost must be >= 0");
    Ok(name)
}

/// Builds a draft from `items` (`(product_id, quantity)` pairs) and saves
/// it as a confirmed order.
pub async fn create_sales_order(
    repo: &dyn QuoteRepository,
    customer_id: i64,
    items: &[(i64, i64)],
    order_date: NaiveDate,
) -> Result<SalesOrder> {
    let customers = repo.list_customers().await?;
    if !customers.iter().any(|c| c.id == customer_id) {
        bail!("unknown customer id {customer_id}");
    }

    let mut draft = SalesOrderDraft::new(order_date);
    draft.customer_id = Some(customer_id);
    for &(product_id, quantity) in items {
        let product = repo
            .get_product(product_id)
            .await
            .with_context(|| format!("Failed to look up product {product_id}"))?;
        draft.add_line(&product, quantity)?;
    }

    let order = repo.create_sales_order(draft.to_new_order()?).await?;
    info!(id = order.id, total = %order.total_amount, "sales order saved");
    Ok(order)
}

pub fn describe_sales_order(
    order: &SalesOrder,
    currency: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "order #{} ({}) {} customer {}",
        order.id, order.status, order.order_date, order.customer_id
    );
    for line in &order.lines {
        let _ = writeln!(
            out,
            "  {:<32}{:>6} x {:>12} = {:>12}",
            line.product_name,
            line.quantity,
            format_money(line.unit_price),
            format_money(line.subtotal())
        );
    }
    let _ = writeln!(out, "total {} {currency}", format_money(order.total_amount));
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quote_core::calculations::estimators::{DrillCycle, DrillingParams, estimate_drilling};
    use quote_db_sqlite::SqliteRepository;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        let repo = SqliteRepository::new_with_pool(pool).await;
        repo.run_migrations().await.expect("Failed to run migrations");
        repo
    }

    // ===== settings tests =====

    #[tokio::test]
    async fn test_set_setting_then_show() {
        let repo = setup_test_db().await;

        set_setting(&repo, " Lathe ", dec!(550)).await.unwrap();
        set_setting(&repo, PROFIT_MARGIN_KEY, dec!(0.5)).await.unwrap();
        let text = show_settings(&repo).await.unwrap();

        assert!(text.contains("Lathe"));
        assert!(text.contains("550.00 / h"));
        assert!(text.contains("0.5"));
    }

    #[tokio::test]
    async fn test_negative_setting_is_rejected() {
        let repo = setup_test_db().await;

        let result = set_setting(&repo, "Lathe", dec!(-1)).await;

        assert!(result.is_err());
        assert!(repo.get_settings().await.unwrap().is_empty());
    }

    // ===== materials tests =====

    #[tokio::test]
    async fn test_add_existing_material_fails() {
        let repo = setup_test_db().await;
        add_material(&repo, "Brass", dec!(300)).await.unwrap();

        let result = add_material(&repo, "Brass", dec!(310)).await;

        assert!(result.is_err());
        assert_eq!(
            repo.get_all_materials().await.unwrap().get("Brass"),
            Some(&dec!(300))
        );
    }

    #[tokio::test]
    async fn test_set_then_delete_material() {
        let repo = setup_test_db().await;

        set_material(&repo, "Brass", dec!(300)).await.unwrap();
        set_material(&repo, "Brass", dec!(320)).await.unwrap();
        let listed = list_materials(&repo).await.unwrap();
        delete_material(&repo, "Brass").await.unwrap();

        assert!(listed.contains("320.00"));
        assert!(repo.get_all_materials().await.unwrap().is_empty());
    }

    // ===== estimator tests =====

    #[tokio::test]
    async fn test_wire_edm_uses_stored_rates() {
        let repo = setup_test_db().await;
        set_setting(&repo, "Wire EDM", dec!(800)).await.unwrap();
        set_setting(&repo, WIRE_EDM_AREA_RATE_KEY, dec!(0.15)).await.unwrap();

        let estimate = estimate_wire_edm(
            &repo,
            WireEdmMethod::Area {
                length_mm: dec!(400),
                thickness_mm: dec!(20),
            },
        )
        .await
        .unwrap();

        assert_eq!(estimate.hours, dec!(1.5));
        assert_eq!(estimate.cost, Some(dec!(1200)));
    }

    #[tokio::test]
    async fn test_wire_edm_area_without_machine_rate_uses_default() {
        let repo = setup_test_db().await;

        let estimate = estimate_wire_edm(
            &repo,
            WireEdmMethod::Area {
                length_mm: dec!(100),
                thickness_mm: dec!(19),
            },
        )
        .await
        .unwrap();

        // 100 * 19 * 0.15 = 285 at 950/h
        assert_eq!(estimate.cost, Some(dec!(285)));
        assert_eq!(estimate.hours, dec!(0.3));
    }

    #[tokio::test]
    async fn test_wire_edm_area_with_zero_machine_rate_fails() {
        let repo = setup_test_db().await;
        set_setting(&repo, "Wire EDM", Decimal::ZERO).await.unwrap();

        let result = estimate_wire_edm(
            &repo,
            WireEdmMethod::Area {
                length_mm: dec!(10),
                thickness_mm: dec!(10),
            },
        )
        .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_describe_drilling_summarizes_pecks() {
        let params = DrillingParams {
            depth: dec!(100),
            feed_rate: dec!(100),
            rapid_rate: dec!(5000),
            hole_count: 1,
            cycle: DrillCycle::Peck {
                peck_depth: dec!(0.03),
            },
        };
        let estimate = estimate_drilling(&params).unwrap();

        let text = describe_drilling(&estimate);

        assert!(text.contains("pecks              3334 (last 0.01 mm)"));
        assert_eq!(text.lines().count(), 5);
    }

    // ===== sales order tests =====

    #[tokio::test]
    async fn test_create_sales_order_totals_lines() {
        let repo = setup_test_db().await;
        let customer = repo.add_customer("ACME").await.unwrap();
        let shaft = repo.add_product("Shaft", dec!(250)).await.unwrap();
        let bush = repo.add_product("Bush", dec!(40.5)).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

        let order = create_sales_order(&repo, customer.id, &[(shaft.id, 2), (bush.id, 3)], date)
            .await
            .unwrap();

        assert_eq!(order.total_amount, dec!(621.5));
        assert_eq!(order.lines.len(), 2);
        assert!(describe_sales_order(&order, "THB").contains("total 621.50 THB"));
    }

    #[tokio::test]
    async fn test_sales_order_rejects_unknown_customer_and_bad_quantity() {
        let repo = setup_test_db().await;
        let customer = repo.add_customer("ACME").await.unwrap();
        let shaft = repo.add_product("Shaft", dec!(250)).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

        let unknown = create_sales_order(&repo, customer.id + 1, &[(shaft.id, 1)], date).await;
        let zero = create_sales_order(&repo, customer.id, &[(shaft.id, 0)], date).await;
        let empty = create_sales_order(&repo, customer.id, &[], date).await;

        assert!(unknown.is_err());
        assert!(zero.is_err());
        assert!(empty.is_err());
    }
}

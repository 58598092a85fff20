//! Quote document data and the exporter boundary.
//!
//! The pricing engine's [`Breakdown`] plus the ledger are flattened into a
//! [`QuoteDocument`], which is all an exporter ever sees.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::calculations::Breakdown;
use crate::models::{Operation, PricingMethod, Quote};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to render quote document")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One row of the operations table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLine {
    pub description: String,
    pub details: String,
    pub cost: Decimal,
}

impl From<&Operation> for DocumentLine {
    fn from(op: &Operation) -> Self {
        let details = match (&op.details, op.method) {
            (Some(details), _) => details.clone(),
            (None, PricingMethod::Time) => format!(
                "{} h x {} ({})",
                op.hours.unwrap_or_default(),
                op.rate.unwrap_or_default(),
                op.rate_name.as_deref().unwrap_or_default()
            ),
            (None, PricingMethod::Fixed) => "fixed".to_string(),
        };
        Self {
            description: op.description.clone(),
            details,
            cost: op.cost_per_unit,
        }
    }
}

/// Everything printed on a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteDocument {
    pub quote_id: String,
    pub date: String,
    pub job_name: String,
    pub customer_name: String,
    pub material: String,
    pub operations: Vec<DocumentLine>,
    pub quantity: i64,
    pub material_cost_per_unit: Decimal,
    pub total_labor_cost_per_unit: Decimal,
    pub sub_total: Decimal,
    pub profit_margin_percent: Decimal,
    pub profit: Decimal,
    pub final_price: Decimal,
    pub price_per_unit: Decimal,
    pub notes: String,
}

impl QuoteDocument {
    /// Builds the document for a priced quote issued at `issued_at`.
    ///
    /// The quote id is `QT-YYYYMMDD-HHMM` and the date is `DD/MM/YYYY`.
    pub fn from_quote(
        quote: &Quote,
        breakdown: &Breakdown,
        issued_at: NaiveDateTime,
    ) -> Self {
        Self {
            quote_id: issued_at.format("QT-%Y%m%d-%H%M").to_string(),
            date: issued_at.format("%d/%m/%Y").to_string(),
            job_name: quote.job_name.clone(),
            customer_name: quote.customer_name.clone(),
            material: quote.material.clone(),
            operations: quote.operations.iter().map(DocumentLine::from).collect(),
            quantity: breakdown.quantity,
            material_cost_per_unit: breakdown.material_cost_per_unit,
            total_labor_cost_per_unit: breakdown.total_labor_cost_per_unit,
            sub_total: breakdown.sub_total,
            profit_margin_percent: breakdown.profit_margin_percent(),
            profit: breakdown.profit,
            final_price: breakdown.final_price,
            price_per_unit: breakdown.price_per_unit,
            notes: quote.notes.clone(),
        }
    }
}

/// Writes a [`QuoteDocument`] to `path`.
///
/// Implementations must not leave a partial file at `path` when they fail.
pub trait QuoteExporter {
    fn export(
        &self,
        document: &QuoteDocument,
        path: &Path,
    ) -> Result<(), ExportError>;
}

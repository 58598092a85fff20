//! HTML quote documents rendered with Tera.
//!
//! The file is written to a temporary sibling and renamed into place, so a
//! failed export never leaves a partial document at the destination.
//! Printing to PDF is left to the browser.

use std::io::Write;
use std::path::Path;

use quote_core::{ExportError, QuoteDocument, QuoteExporter};
use serde::Serialize;
use tempfile::NamedTempFile;
use tera::Tera;
use tracing::info;

use crate::config::Language;
use crate::summary::Labels;
use crate::utils::{format_money, format_percent};

const TEMPLATE_NAME: &str = "quote.html";
const TEMPLATE: &str = include_str!("../templates/quote.html");

#[derive(Debug, Serialize)]
struct Row<'a> {
    description: &'a str,
    details: &'a str,
    cost: String,
}

pub struct HtmlQuoteExporter {
    tera: Tera,
    language: Language,
    currency: String,
}

impl HtmlQuoteExporter {
    pub fn new(
        language: Language,
        currency: impl Into<String>,
    ) -> Result<Self, ExportError> {
        Self::with_template(language, currency, TEMPLATE)
    }

    fn with_template(
        language: Language,
        currency: impl Into<String>,
        template: &str,
    ) -> Result<Self, ExportError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template)
            .map_err(|e| ExportError::Render(Box::new(e)))?;
        Ok(Self {
            tera,
            language,
            currency: currency.into(),
        })
    }

    /// Renders the document to an HTML string.
    pub fn render(
        &self,
        document: &QuoteDocument,
    ) -> Result<String, ExportError> {
        let rows: Vec<Row<'_>> = document
            .operations
            .iter()
            .map(|line| Row {
                description: &line.description,
                details: &line.details,
                cost: format_money(line.cost),
            })
            .collect();

        let mut context = tera::Context::new();
        context.insert("lang", &self.lang_code());
        context.insert("labels", Labels::for_language(self.language));
        context.insert("title", Labels::for_language(self.language).title);
        context.insert("currency", &self.currency);
        context.insert("quote_id", &document.quote_id);
        context.insert("date", &document.date);
        context.insert("job_name", &document.job_name);
        context.insert("customer_name", &document.customer_name);
        context.insert("material", &document.material);
        context.insert("quantity", &document.quantity);
        context.insert("operations", &rows);
        context.insert(
            "material_cost_per_unit",
            &format_money(document.material_cost_per_unit),
        );
        context.insert(
            "total_labor_cost_per_unit",
            &format_money(document.total_labor_cost_per_unit),
        );
        context.insert("sub_total", &format_money(document.sub_total));
        context.insert(
            "profit_margin_percent",
            &format_percent(document.profit_margin_percent),
        );
        context.insert("profit", &format_money(document.profit));
        context.insert("final_price", &format_money(document.final_price));
        context.insert("price_per_unit", &format_money(document.price_per_unit));
        context.insert("notes", &document.notes);

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| ExportError::Render(Box::new(e)))
    }

    fn lang_code(&self) -> &'static str {
        match self.language {
            Language::Th => "th",
            Language::En => "en",
        }
    }
}

fn io_error(
    path: &Path,
    source: std::io::Error,
) -> ExportError {
    ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl QuoteExporter for HtmlQuoteExporter {
    fn export(
        &self,
        document: &QuoteDocument,
        path: &Path,
    ) -> Result<(), ExportError> {
        let html = self.render(document)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(|e| io_error(path, e))?;
        file.write_all(html.as_bytes())
            .map_err(|e| io_error(path, e))?;
        file.persist(path).map_err(|e| io_error(path, e.error))?;

        info!(path = %path.display(), quote_id = %document.quote_id, "quote exported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quote_core::DocumentLine;
    use rust_decimal_macros::dec;

    use super::*;

    fn document() -> QuoteDocument {
        QuoteDocument {
            quote_id: "QT-20250307-0930".to_string(),
            date: "07/03/2025".to_string(),
            job_name: "Bracket <rev B>".to_string(),
            customer_name: "ACME".to_string(),
            material: "Steel S45C".to_string(),
            operations: vec![DocumentLine {
                description: "Turning".to_string(),
                details: "2 h x 550 (Lathe)".to_string(),
                cost: dec!(1100),
            }],
            quantity: 2,
            material_cost_per_unit: dec!(80),
            total_labor_cost_per_unit: dec!(1100),
            sub_total: dec!(2360),
            profit_margin_percent: dec!(25.00),
            profit: dec!(590),
            final_price: dec!(2950),
            price_per_unit: dec!(1475),
            notes: String::new(),
        }
    }

    #[test]
    fn render_formats_money_and_escapes_text() {
        let exporter = HtmlQuoteExporter::new(Language::En, "THB").unwrap();

        let html = exporter.render(&document()).unwrap();

        assert!(html.contains("QT-20250307-0930"));
        assert!(html.contains("2,950.00 THB"));
        assert!(html.contains("1,100.00"));
        assert!(html.contains("Profit (25%)"));
        assert!(html.contains("Bracket &lt;rev B&gt;"));
        assert!(!html.contains("class=\"notes\""));
    }

    #[test]
    fn thai_labels_are_used_for_thai() {
        let exporter = HtmlQuoteExporter::new(Language::Th, "บาท").unwrap();

        let html = exporter.render(&document()).unwrap();

        assert!(html.contains("ใบเสนอราคา"));
        assert!(html.contains("lang=\"th\""));
    }

    #[test]
    fn template_syntax_error_keeps_tera_cause() {
        let result = HtmlQuoteExporter::with_template(Language::En, "THB", "{% if %}");

        let Err(err) = result else {
            panic!("expected a render error");
        };
        assert!(matches!(err, ExportError::Render(_)));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<tera::Error>().is_some());
    }

    #[test]
    fn render_failure_keeps_tera_cause() {
        let exporter =
            HtmlQuoteExporter::with_template(Language::En, "THB", "{{ no_such_field }}").unwrap();

        let err = exporter.render(&document()).unwrap_err();

        assert_eq!(err.to_string(), "failed to render quote document");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn failed_export_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("quote.html");
        let exporter = HtmlQuoteExporter::new(Language::En, "THB").unwrap();

        let result = exporter.export(&document(), &target);

        assert!(matches!(result, Err(ExportError::Io { .. })));
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

//! Plain-text quote summary for the terminal.

use std::fmt;

use quote_core::calculations::pricing::{CostComponent, CostShare};
use quote_core::{Breakdown, Quote};
use serde::Serialize;

use crate::config::Language;
use crate::utils::{format_money, format_percent};

/// Fixed strings for one display language, shared by the summary and the
/// exported document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Labels {
    pub title: &'static str,
    pub quote_id: &'static str,
    pub date: &'static str,
    pub description: &'static str,
    pub details: &'static str,
    pub cost_per_unit: &'static str,
    pub job: &'static str,
    pub customer: &'static str,
    pub material: &'static str,
    pub quantity: &'static str,
    pub operations: &'static str,
    pub material_cost_per_unit: &'static str,
    pub labor_cost_per_unit: &'static str,
    pub sub_total: &'static str,
    pub profit: &'static str,
    pub final_price: &'static str,
    pub price_per_unit: &'static str,
    pub cost_shares: &'static str,
    pub material_share: &'static str,
    pub labor_share: &'static str,
    pub profit_share: &'static str,
    pub warning: &'static str,
}

const EN: Labels = Labels {
    title: "Quotation",
    quote_id: "Quote no.",
    date: "Date",
    description: "Description",
    details: "Details",
    cost_per_unit: "Cost / unit",
    job: "Job",
    customer: "Customer",
    material: "Material",
    quantity: "Quantity",
    operations: "Operations",
    material_cost_per_unit: "Material cost / unit",
    labor_cost_per_unit: "Labor cost / unit",
    sub_total: "Subtotal",
    profit: "Profit",
    final_price: "Final price",
    price_per_unit: "Price / unit",
    cost_shares: "Cost shares",
    material_share: "Material",
    labor_share: "Labor",
    profit_share: "Profit",
    warning: "Warning",
};

const TH: Labels = Labels {
    title: "ใบเสนอราคา",
    quote_id: "เลขที่",
    date: "วันที่",
    description: "รายการ",
    details: "รายละเอียด",
    cost_per_unit: "ต้นทุน / ชิ้น",
    job: "ชื่องาน",
    customer: "ลูกค้า",
    material: "วัสดุ",
    quantity: "จำนวน",
    operations: "ขั้นตอนการผลิต",
    material_cost_per_unit: "ค่าวัสดุ / ชิ้น",
    labor_cost_per_unit: "ค่าแรง / ชิ้น",
    sub_total: "รวมต้นทุน",
    profit: "กำไร",
    final_price: "ราคาสุทธิ",
    price_per_unit: "ราคา / ชิ้น",
    cost_shares: "สัดส่วนต้นทุน",
    material_share: "วัสดุ",
    labor_share: "ค่าแรง",
    profit_share: "กำไร",
    warning: "คำเตือน",
};

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::Th => &TH,
            Language::En => &EN,
        }
    }

    pub fn component(
        &self,
        component: CostComponent,
    ) -> &'static str {
        match component {
            CostComponent::Material => self.material_share,
            CostComponent::Labor => self.labor_share,
            CostComponent::Profit => self.profit_share,
        }
    }
}

/// Renders a priced quote with `Display`.
pub struct QuoteSummary<'a> {
    pub quote: &'a Quote,
    pub breakdown: &'a Breakdown,
    pub labels: &'a Labels,
    pub currency: &'a str,
}

impl QuoteSummary<'_> {
    fn money(
        &self,
        f: &mut fmt::Formatter<'_>,
        label: &str,
        value: rust_decimal::Decimal,
    ) -> fmt::Result {
        writeln!(f, "{label:<24}{:>16} {}", format_money(value), self.currency)
    }

    fn share(
        &self,
        f: &mut fmt::Formatter<'_>,
        share: &CostShare,
    ) -> fmt::Result {
        writeln!(
            f,
            "  {:<22}{:>16} {} ({})",
            self.labels.component(share.component),
            format_money(share.amount),
            self.currency,
            format_percent(share.percent)
        )
    }
}

impl fmt::Display for QuoteSummary<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let labels = self.labels;
        let b = self.breakdown;

        writeln!(f, "{:<24}{}", labels.job, self.quote.job_name)?;
        writeln!(f, "{:<24}{}", labels.customer, self.quote.customer_name)?;
        writeln!(f, "{:<24}{}", labels.material, self.quote.material)?;
        writeln!(f, "{:<24}{}", labels.quantity, b.quantity)?;

        if !self.quote.operations.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", labels.operations)?;
            for op in self.quote.operations.iter() {
                writeln!(
                    f,
                    "  #{:<3}{:<36}{:>16} {}",
                    op.id,
                    op.description,
                    format_money(op.cost_per_unit),
                    self.currency
                )?;
            }
        }

        writeln!(f)?;
        self.money(f, labels.material_cost_per_unit, b.material_cost_per_unit)?;
        self.money(f, labels.labor_cost_per_unit, b.total_labor_cost_per_unit)?;
        self.money(f, labels.sub_total, b.sub_total)?;
        self.money(
            f,
            &format!("{} ({})", labels.profit, format_percent(b.profit_margin_percent())),
            b.profit,
        )?;
        self.money(f, labels.final_price, b.final_price)?;
        self.money(f, labels.price_per_unit, b.price_per_unit)?;

        let shares = b.cost_shares();
        if !shares.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", labels.cost_shares)?;
            for share in &shares {
                self.share(f, share)?;
            }
        }

        for miss in &b.lookup_misses {
            writeln!(f, "{}: {miss}", labels.warning)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use quote_core::{MaterialTable, OperationParams, RateTable, price};
    use rust_decimal_macros::dec;

    use super::*;

    fn priced(material: &str) -> (Quote, Breakdown) {
        let rates = RateTable::from_settings(&HashMap::from([
            ("Lathe".to_string(), dec!(550)),
            ("profit_margin".to_string(), dec!(0.25)),
        ]));
        let materials =
            MaterialTable::new(BTreeMap::from([("Steel S45C".to_string(), dec!(80))]));
        let mut quote = Quote::new("Bracket", "ACME", material, 2);
        quote
            .operations
            .add(
                "Turning",
                OperationParams::Time {
                    hours: dec!(2),
                    rate_name: "Lathe".to_string(),
                },
                &rates,
            )
            .unwrap();
        let breakdown = price(&quote, &rates, &materials).unwrap();
        (quote, breakdown)
    }

    #[test]
    fn english_summary_shows_totals_and_shares() {
        let (quote, breakdown) = priced("Steel S45C");
        let summary = QuoteSummary {
            quote: &quote,
            breakdown: &breakdown,
            labels: Labels::for_language(Language::En),
            currency: "THB",
        };

        let text = summary.to_string();

        assert!(text.contains("Final price"));
        assert!(text.contains("2,950.00 THB"));
        assert!(text.contains("1,475.00 THB"));
        assert!(text.contains("Profit (25%)"));
        assert!(text.contains("(20%)"));
        assert!(!text.contains("Warning"));
    }

    #[test]
    fn unknown_material_is_flagged() {
        let (quote, breakdown) = priced("Unobtainium");
        let summary = QuoteSummary {
            quote: &quote,
            breakdown: &breakdown,
            labels: Labels::for_language(Language::Th),
            currency: "THB",
        };

        let text = summary.to_string();

        assert!(text.contains("คำเตือน: unknown material 'Unobtainium' priced as 0"));
        assert!(text.contains("ราคาสุทธิ"));
    }

    #[test]
    fn column_labels_are_distinct_in_every_language() {
        for language in [Language::En, Language::Th] {
            let labels = Labels::for_language(language);

            assert_ne!(labels.cost_per_unit, labels.price_per_unit);
        }
        assert_eq!(Labels::for_language(Language::Th).cost_per_unit, "ต้นทุน / ชิ้น");
    }
}

//! Quote pricing: material + labor, scaled by quantity, plus a flat margin.
//!
//! ```text
//! total_material_cost = material_cost_per_unit * quantity
//! total_labor_cost    = Σ operation.cost_per_unit * quantity
//! sub_total           = total_material_cost + total_labor_cost
//! profit              = sub_total * profit_margin
//! final_price         = sub_total + profit
//! price_per_unit      = final_price / quantity
//! ```
//!
//! Nothing is rounded here. Callers round with
//! [`round_half_up`](super::common::round_half_up) when displaying.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::common::percent_of;
use super::estimators::EstimateError;
use super::lookup::resolve;
use crate::models::{LookupKind, LookupMiss, LookupPolicy, MaterialTable, Quote, RateTable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    #[error("{reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("unknown machine rate '{0}'")]
    UnknownRate(String),

    #[error("unknown material '{0}'")]
    UnknownMaterial(String),

    #[error(transparent)]
    Estimate(#[from] EstimateError),
}

impl QuoteError {
    pub fn invalid(
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

const QUANTITY_REASON: &str = "quantity must be > 0";

/// Unwraps a checked decimal operation, naming `field` when it overflowed.
pub(crate) fn in_range(
    field: &'static str,
    value: Option<Decimal>,
) -> Result<Decimal, QuoteError> {
    value.ok_or_else(|| QuoteError::invalid(field, format!("{field} is out of range")))
}

/// Parses the quantity field. An empty field means one piece.
pub fn parse_quantity(input: &str) -> Result<i64, QuoteError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(1);
    }
    let quantity: i64 = trimmed
        .parse()
        .map_err(|_| QuoteError::invalid("quantity", QUANTITY_REASON))?;
    if quantity <= 0 {
        return Err(QuoteError::invalid("quantity", QUANTITY_REASON));
    }
    Ok(quantity)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostComponent {
    Material,
    Labor,
    Profit,
}

/// One slice of the final price, for the summary chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostShare {
    pub component: CostComponent,
    pub amount: Decimal,
    /// Share of the final price, 0-100.
    pub percent: Decimal,
}

/// Every intermediate and final value computed for one quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub quantity: i64,
    pub material_cost_per_unit: Decimal,
    pub total_material_cost: Decimal,
    pub total_labor_cost_per_unit: Decimal,
    pub total_labor_cost: Decimal,
    pub sub_total: Decimal,
    pub profit_margin: Decimal,
    pub profit: Decimal,
    pub final_price: Decimal,
    pub price_per_unit: Decimal,
    /// Names that priced as zero, material first, then operations in order.
    pub lookup_misses: Vec<LookupMiss>,
}

impl Breakdown {
    /// Margin as a percentage, e.g. `25` for a 0.25 margin.
    pub fn profit_margin_percent(&self) -> Decimal {
        self.profit_margin * Decimal::ONE_HUNDRED
    }

    /// Material, labor and profit as shares of the final price. Zero
    /// slices are left out; a zero final price yields no slices.
    pub fn cost_shares(&self) -> Vec<CostShare> {
        [
            (CostComponent::Material, self.total_material_cost),
            (CostComponent::Labor, self.total_labor_cost),
            (CostComponent::Profit, self.profit),
        ]
        .into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .filter_map(|(component, amount)| {
            percent_of(amount, self.final_price).map(|percent| CostShare {
                component,
                amount,
                percent,
            })
        })
        .collect()
    }
}

/// Single source of quote prices for every surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingEngine {
    policy: LookupPolicy,
}

impl PricingEngine {
    pub fn new(policy: LookupPolicy) -> Self {
        Self { policy }
    }

    /// Prices `quote` against a rate and material snapshot.
    ///
    /// # Errors
    ///
    /// * [`QuoteError::InvalidInput`] when the quantity is below 1 or a total
    ///   does not fit in a `Decimal`.
    /// * [`QuoteError::UnknownMaterial`] when the material is missing and the
    ///   engine is strict.
    pub fn price(
        &self,
        quote: &Quote,
        rates: &RateTable,
        materials: &MaterialTable,
    ) -> Result<Breakdown, QuoteError> {
        if quote.quantity <= 0 {
            return Err(QuoteError::invalid("quantity", QUANTITY_REASON));
        }
        let quantity = Decimal::from(quote.quantity);

        let (material_cost_per_unit, material_miss) = resolve(
            self.policy,
            LookupKind::Material,
            &quote.material,
            materials.cost(&quote.material),
        )?;

        let mut lookup_misses: Vec<LookupMiss> = material_miss.into_iter().collect();
        lookup_misses.extend(quote.operations.lookup_misses().cloned());

        let total_labor_cost_per_unit = quote.operations.total_cost_per_unit()?;
        let total_material_cost =
            in_range("total_material_cost", material_cost_per_unit.checked_mul(quantity))?;
        let total_labor_cost =
            in_range("total_labor_cost", total_labor_cost_per_unit.checked_mul(quantity))?;
        let sub_total = in_range("sub_total", total_material_cost.checked_add(total_labor_cost))?;
        let profit = in_range("profit", sub_total.checked_mul(rates.profit_margin))?;
        let final_price = in_range("final_price", sub_total.checked_add(profit))?;
        let price_per_unit = in_range("price_per_unit", final_price.checked_div(quantity))?;

        debug!(
            job = %quote.job_name,
            quantity = quote.quantity,
            final_price = %final_price,
            "quote priced"
        );

        Ok(Breakdown {
            quantity: quote.quantity,
            material_cost_per_unit,
            total_material_cost,
            total_labor_cost_per_unit,
            total_labor_cost,
            sub_total,
            profit_margin: rates.profit_margin,
            profit,
            final_price,
            price_per_unit,
            lookup_misses,
        })
    }
}

/// Prices `quote` using the lookup policy its ledger was built with.
pub fn price(
    quote: &Quote,
    rates: &RateTable,
    materials: &MaterialTable,
) -> Result<Breakdown, QuoteError> {
    PricingEngine::new(quote.operations.policy()).price(quote, rates, materials)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::OperationParams;

    fn rates() -> RateTable {
        RateTable::from_settings(&HashMap::from([
            ("Lathe".to_string(), dec!(550)),
            ("Milling".to_string(), dec!(650)),
            ("profit_margin".to_string(), dec!(0.25)),
        ]))
    }

    fn materials() -> MaterialTable {
        MaterialTable::new(BTreeMap::from([
            ("เหล็ก (Steel S45C)".to_string(), dec!(80)),
            ("อลูมิเนียม (Aluminum 6061)".to_string(), dec!(180)),
        ]))
    }

    fn steel_quote(quantity: i64) -> Quote {
        let mut quote = Quote::new("Shaft", "ACME", "เหล็ก (Steel S45C)", quantity);
        quote
            .operations
            .add(
                "Turning",
                OperationParams::Time {
                    hours: dec!(2),
                    rate_name: "Lathe".to_string(),
                },
                &rates(),
            )
            .unwrap();
        quote
    }

    // =========================================================================
    // parse_quantity tests
    // =========================================================================

    #[test]
    fn empty_quantity_means_one() {
        assert_eq!(parse_quantity(""), Ok(1));
        assert_eq!(parse_quantity("  "), Ok(1));
    }

    #[test]
    fn quantity_zero_is_invalid() {
        let err = parse_quantity("0").unwrap_err();

        assert_eq!(err.to_string(), "quantity must be > 0");
    }

    #[test]
    fn quantity_non_numeric_is_invalid() {
        assert_eq!(parse_quantity("abc"), Err(QuoteError::invalid("quantity", QUANTITY_REASON)));
        assert_eq!(parse_quantity("-3"), Err(QuoteError::invalid("quantity", QUANTITY_REASON)));
    }

    // =========================================================================
    // price tests
    // =========================================================================

    #[test]
    fn steel_shaft_example() {
        let quote = steel_quote(2);

        let result = price(&quote, &rates(), &materials()).unwrap();

        assert_eq!(result.material_cost_per_unit, dec!(80));
        assert_eq!(result.total_material_cost, dec!(160));
        assert_eq!(result.total_labor_cost_per_unit, dec!(1100));
        assert_eq!(result.total_labor_cost, dec!(2200));
        assert_eq!(result.sub_total, dec!(2360));
        assert_eq!(result.profit, dec!(590));
        assert_eq!(result.final_price, dec!(2950));
        assert_eq!(result.price_per_unit, dec!(1475));
        assert!(result.lookup_misses.is_empty());
    }

    #[test]
    fn zero_quote_prices_to_zero() {
        let materials = MaterialTable::new(BTreeMap::from([("Scrap".to_string(), dec!(0))]));
        let quote = Quote::new("", "", "Scrap", 1);

        let result = price(&quote, &rates(), &materials).unwrap();

        assert_eq!(result.final_price, Decimal::ZERO);
        assert_eq!(result.price_per_unit, Decimal::ZERO);
        assert!(result.cost_shares().is_empty());
    }

    #[test]
    fn pricing_is_idempotent() {
        let quote = steel_quote(3);
        let before = quote.clone();

        let first = price(&quote, &rates(), &materials()).unwrap();
        let second = price(&quote, &rates(), &materials()).unwrap();

        assert_eq!(first, second);
        assert_eq!(quote, before);
    }

    #[test]
    fn unknown_material_prices_as_zero_and_is_reported() {
        let mut quote = steel_quote(1);
        quote.material = "Unobtainium".to_string();

        let result = price(&quote, &rates(), &materials()).unwrap();

        assert_eq!(result.material_cost_per_unit, Decimal::ZERO);
        assert_eq!(result.sub_total, dec!(1100));
        assert_eq!(
            result.lookup_misses,
            vec![LookupMiss {
                kind: LookupKind::Material,
                name: "Unobtainium".to_string(),
            }]
        );
    }

    #[test]
    fn unknown_material_fails_when_strict() {
        let mut quote = steel_quote(1);
        quote.material = "Unobtainium".to_string();

        let result = PricingEngine::new(LookupPolicy::Strict).price(&quote, &rates(), &materials());

        assert_eq!(result, Err(QuoteError::UnknownMaterial("Unobtainium".to_string())));
    }

    #[test]
    fn zero_quantity_is_rejected_without_touching_ledger() {
        let quote = steel_quote(0);
        let ledger_before = quote.operations.clone();

        let result = price(&quote, &rates(), &materials());

        assert_eq!(result, Err(QuoteError::invalid("quantity", QUANTITY_REASON)));
        assert_eq!(quote.operations, ledger_before);
    }

    #[test]
    fn huge_order_is_invalid_input_instead_of_overflowing() {
        let quote = Quote::new("Block", "ACME", "Steel", 9_000_000_000_000_000_000);
        let materials =
            MaterialTable::new(BTreeMap::from([("Steel".to_string(), dec!(100000000000))]));

        let result = price(&quote, &rates(), &materials);

        assert_eq!(
            result,
            Err(QuoteError::invalid(
                "total_material_cost",
                "total_material_cost is out of range"
            ))
        );
    }

    #[test]
    fn margin_overflow_names_profit() {
        let quote = Quote::new("Block", "ACME", "Steel", 1);
        let materials = MaterialTable::new(BTreeMap::from([("Steel".to_string(), Decimal::MAX)]));
        let rates = RateTable::from_settings(&HashMap::from([(
            "profit_margin".to_string(),
            dec!(2),
        )]));

        let err = price(&quote, &rates, &materials).unwrap_err();

        assert_eq!(err, QuoteError::invalid("profit", "profit is out of range"));
    }

    #[test]
    fn margin_comes_from_rate_table() {
        let mut rates = rates();
        rates.profit_margin = dec!(0.10);
        let quote = steel_quote(1);

        let result = price(&quote, &rates, &materials()).unwrap();

        // (80 + 1100) * 0.10
        assert_eq!(result.profit, dec!(118));
        assert_eq!(result.profit_margin_percent(), dec!(10));
    }

    #[test]
    fn rate_misses_from_ledger_are_carried_into_breakdown() {
        let mut quote = Quote::new("Plate", "ACME", "อลูมิเนียม (Aluminum 6061)", 1);
        quote
            .operations
            .add(
                "Laser",
                OperationParams::Time {
                    hours: dec!(1),
                    rate_name: "Laser".to_string(),
                },
                &rates(),
            )
            .unwrap();

        let result = price(&quote, &rates(), &materials()).unwrap();

        assert_eq!(result.lookup_misses.len(), 1);
        assert_eq!(result.lookup_misses[0].kind, LookupKind::Rate);
    }

    // =========================================================================
    // cost_shares tests
    // =========================================================================

    #[test]
    fn cost_shares_sum_to_final_price() {
        let result = price(&steel_quote(2), &rates(), &materials()).unwrap();

        let shares = result.cost_shares();

        assert_eq!(
            shares.iter().map(|s| s.component).collect::<Vec<_>>(),
            vec![CostComponent::Material, CostComponent::Labor, CostComponent::Profit]
        );
        assert_eq!(shares.iter().map(|s| s.amount).sum::<Decimal>(), dec!(2950));
        assert_eq!(shares[2].percent, dec!(20));
    }

    #[test]
    fn cost_shares_drop_zero_slices() {
        let quote = Quote::new("Stock only", "", "เหล็ก (Steel S45C)", 5);
        let mut rates = rates();
        rates.profit_margin = Decimal::ZERO;

        let shares = price(&quote, &rates, &materials()).unwrap().cost_shares();

        assert_eq!(
            shares,
            vec![CostShare {
                component: CostComponent::Material,
                amount: dec!(400),
                percent: dec!(100),
            }]
        );
    }
}

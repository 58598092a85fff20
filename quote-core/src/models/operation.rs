use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::LookupMiss;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingMethod {
    /// Hours on a machine multiplied by that machine's hourly rate.
    Time,
    /// A cost entered directly.
    Fixed,
}

/// User input for a new ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationParams {
    Time { hours: Decimal, rate_name: String },
    Fixed { cost: Decimal },
}

impl OperationParams {
    pub fn method(&self) -> PricingMethod {
        match self {
            Self::Time { .. } => PricingMethod::Time,
            Self::Fixed { .. } => PricingMethod::Fixed,
        }
    }
}

/// One priced line of a quote.
///
/// For [`PricingMethod::Time`] entries `hours`, `rate_name` and `rate` are
/// set and `cost_per_unit == hours * rate`. For [`PricingMethod::Fixed`]
/// entries they are `None` and `cost_per_unit` is the entered cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: u32,
    pub description: String,
    /// Generated parameter summary, e.g. the drilling cycle that produced
    /// the hours.
    pub details: Option<String>,
    pub method: PricingMethod,
    pub hours: Option<Decimal>,
    pub rate_name: Option<String>,
    pub rate: Option<Decimal>,
    pub cost_per_unit: Decimal,
    /// Set when `rate_name` was not in the rate table and priced as zero.
    pub lookup_miss: Option<LookupMiss>,
}

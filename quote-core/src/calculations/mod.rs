//! Quote arithmetic: cycle-time estimators, the operation ledger, and the
//! pricing engine that turns a quote into a [`Breakdown`].

pub mod common;
pub mod estimators;
pub mod ledger;
mod lookup;
pub mod pricing;

pub use estimators::EstimateError;
pub use ledger::OperationLedger;
pub use pricing::{
    Breakdown, CostComponent, CostShare, PricingEngine, QuoteError, parse_quantity, price,
};

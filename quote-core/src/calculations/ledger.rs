//! The ordered list of priced operations for one quote.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::common::minutes_to_hours;
use super::estimators::{DrillingParams, WireEdmEstimator, WireEdmMethod, estimate_drilling};
use super::lookup::resolve;
use super::pricing::{QuoteError, in_range};
use crate::models::{
    LookupKind, LookupMiss, LookupPolicy, Operation, OperationParams, RateTable, WIRE_EDM_MACHINE,
};

/// Operations in insertion order plus the counter that numbers them.
///
/// Ids start at 1 and are never reused within a ledger, even after the
/// operation holding one is removed. Entries are never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLedger {
    operations: Vec<Operation>,
    next_id: u32,
    policy: LookupPolicy,
}

impl Default for OperationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationLedger {
    pub fn new() -> Self {
        Self::with_policy(LookupPolicy::default())
    }

    pub fn with_policy(policy: LookupPolicy) -> Self {
        Self {
            operations: Vec::new(),
            next_id: 1,
            policy,
        }
    }

    pub fn policy(&self) -> LookupPolicy {
        self.policy
    }

    /// Prices and appends a new operation.
    ///
    /// # Errors
    ///
    /// * [`QuoteError::InvalidInput`] for negative hours or cost.
    /// * [`QuoteError::UnknownRate`] when `rate_name` is missing and the
    ///   ledger is strict.
    pub fn add(
        &mut self,
        description: impl Into<String>,
        params: OperationParams,
        rates: &RateTable,
    ) -> Result<Operation, QuoteError> {
        self.push(description.into(), None, params, rates)
    }

    /// Like [`add`](Self::add) but also records a parameter summary for
    /// the quote document.
    pub fn add_detailed(
        &mut self,
        description: impl Into<String>,
        details: impl Into<String>,
        params: OperationParams,
        rates: &RateTable,
    ) -> Result<Operation, QuoteError> {
        self.push(description.into(), Some(details.into()), params, rates)
    }

    /// Runs the drilling estimator and books the result as hours on
    /// `machine`.
    pub fn add_drilling(
        &mut self,
        description: impl Into<String>,
        machine: &str,
        drilling: &DrillingParams,
        rates: &RateTable,
    ) -> Result<Operation, QuoteError> {
        let estimate = estimate_drilling(drilling)?;
        let params = OperationParams::Time {
            hours: minutes_to_hours(estimate.total_minutes),
            rate_name: machine.to_string(),
        };
        self.add_detailed(description, drilling.describe(), params, rates)
    }

    /// Runs the wire-EDM estimator and books the result as hours on the
    /// `Wire EDM` machine, priced at the same hourly rate the estimator used.
    pub fn add_wire_edm(
        &mut self,
        description: impl Into<String>,
        method: WireEdmMethod,
        rates: &RateTable,
    ) -> Result<Operation, QuoteError> {
        let estimator = WireEdmEstimator::from_rates(rates);
        let estimate = estimator.estimate(method)?;
        let params = OperationParams::Time {
            hours: estimate.hours,
            rate_name: WIRE_EDM_MACHINE.to_string(),
        };
        if rates.rate(WIRE_EDM_MACHINE).is_some() {
            return self.add_detailed(description, method.describe(), params, rates);
        }
        let mut with_default = rates.clone();
        with_default
            .hourly_rates
            .insert(WIRE_EDM_MACHINE.to_string(), estimator.hourly_rate);
        self.add_detailed(description, method.describe(), params, &with_default)
    }

    fn push(
        &mut self,
        description: String,
        details: Option<String>,
        params: OperationParams,
        rates: &RateTable,
    ) -> Result<Operation, QuoteError> {
        let method = params.method();
        let (hours, rate_name, rate, cost_per_unit, lookup_miss) = match params {
            OperationParams::Time { hours, rate_name } => {
                if hours < Decimal::ZERO {
                    return Err(QuoteError::invalid("hours", "hours must be >= 0"));
                }
                let (rate, miss) =
                    resolve(self.policy, LookupKind::Rate, &rate_name, rates.rate(&rate_name))?;
                let cost = in_range("hours", hours.checked_mul(rate))?;
                (Some(hours), Some(rate_name), Some(rate), cost, miss)
            }
            OperationParams::Fixed { cost } => {
                if cost < Decimal::ZERO {
                    return Err(QuoteError::invalid("cost", "cost must be >= 0"));
                }
                (None, None, None, cost, None)
            }
        };

        let operation = Operation {
            id: self.next_id,
            description,
            details,
            method,
            hours,
            rate_name,
            rate,
            cost_per_unit,
            lookup_miss,
        };
        self.next_id += 1;
        debug!(id = operation.id, cost = %operation.cost_per_unit, "operation added");
        self.operations.push(operation.clone());
        Ok(operation)
    }

    /// Removes the operation with `id`, returning it. Unknown ids are
    /// ignored.
    pub fn remove(
        &mut self,
        id: u32,
    ) -> Option<Operation> {
        let index = self.operations.iter().position(|op| op.id == id)?;
        Some(self.operations.remove(index))
    }

    pub fn get(
        &self,
        id: u32,
    ) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    /// # Errors
    ///
    /// [`QuoteError::InvalidInput`] when the sum does not fit in a `Decimal`.
    pub fn total_cost_per_unit(&self) -> Result<Decimal, QuoteError> {
        self.operations.iter().try_fold(Decimal::ZERO, |total, op| {
            in_range("total_labor_cost_per_unit", total.checked_add(op.cost_per_unit))
        })
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    /// Rate names that priced as zero, in operation order.
    pub fn lookup_misses(&self) -> impl Iterator<Item = &LookupMiss> {
        self.operations.iter().filter_map(|op| op.lookup_miss.as_ref())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

//! Machining cycle-time estimators.
//!
//! Each estimator is a pure function of its parameters. Drilling estimates
//! are returned in minutes; wire-EDM estimates are returned in hours because
//! the area method derives them from a cost and an hourly rate.

pub mod drilling;
pub mod wire_edm;

use rust_decimal::Decimal;
use thiserror::Error;

pub use drilling::{DrillCycle, DrillingEstimate, DrillingParams, estimate_drilling};
pub use wire_edm::{WireEdmEstimate, WireEdmEstimator, WireEdmMethod};

/// Errors raised by the estimators and by field parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimateError {
    /// A field is non-numeric or outside its allowed range.
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// A divisor field is zero.
    #[error("{field} is zero")]
    DivisionByZero { field: &'static str },
}

impl EstimateError {
    pub fn invalid(
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the field that failed.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidInput { field, .. } | Self::DivisionByZero { field } => field,
        }
    }
}

/// Parses a decimal form field, tolerating surrounding whitespace and comma
/// thousands separators.
pub fn parse_decimal_field(
    field: &'static str,
    input: &str,
) -> Result<Decimal, EstimateError> {
    let normalized = input.trim().replace(',', "");
    if normalized.is_empty() {
        return Err(EstimateError::invalid(field, "a number is required"));
    }
    normalized
        .parse()
        .map_err(|_| EstimateError::invalid(field, format!("'{input}' is not a number")))
}

/// Parses a whole-number count field such as a hole count.
pub fn parse_count_field(
    field: &'static str,
    input: &str,
) -> Result<u32, EstimateError> {
    let trimmed = input.trim();
    trimmed
        .parse()
        .map_err(|_| EstimateError::invalid(field, format!("'{input}' is not a whole number")))
}

pub(crate) fn require_positive(
    field: &'static str,
    value: Decimal,
) -> Result<Decimal, EstimateError> {
    if value <= Decimal::ZERO {
        return Err(EstimateError::invalid(field, "must be > 0"));
    }
    Ok(value)
}

/// Unwraps a checked decimal operation, naming `field` when it overflowed.
pub(crate) fn in_range(
    field: &'static str,
    value: Option<Decimal>,
) -> Result<Decimal, EstimateError> {
    value.ok_or_else(|| EstimateError::invalid(field, "is out of range"))
}

pub(crate) fn require_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<Decimal, EstimateError> {
    if value < Decimal::ZERO {
        return Err(EstimateError::invalid(field, "must be >= 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_decimal_field_accepts_thousands_separator() {
        assert_eq!(parse_decimal_field("depth", " 1,250.5 "), Ok(dec!(1250.5)));
    }

    #[test]
    fn parse_decimal_field_names_failing_field() {
        let err = parse_decimal_field("feed_rate", "fast").unwrap_err();

        assert_eq!(err.field(), "feed_rate");
        assert_eq!(err.to_string(), "invalid feed_rate: 'fast' is not a number");
    }

    #[test]
    fn parse_decimal_field_rejects_empty_input() {
        let err = parse_decimal_field("depth", "   ").unwrap_err();

        assert_eq!(err, EstimateError::invalid("depth", "a number is required"));
    }

    #[test]
    fn parse_count_field_rejects_fractions() {
        assert_eq!(parse_count_field("hole_count", "12"), Ok(12));
        assert_eq!(parse_count_field("hole_count", "1.5").unwrap_err().field(), "hole_count");
    }
}

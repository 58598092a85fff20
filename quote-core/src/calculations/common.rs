//! Common utility functions shared by the estimators and the pricing engine.
//!
//! Nothing in here rounds intermediate results; [`round_half_up`] is meant
//! for presentation only.

use rust_decimal::Decimal;

pub const MINUTES_PER_HOUR: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use quote_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an estimator result in minutes to ledger hours.
///
/// ```
/// use rust_decimal_macros::dec;
/// use quote_core::calculations::common::minutes_to_hours;
///
/// assert_eq!(minutes_to_hours(dec!(90)), dec!(1.5));
/// ```
pub fn minutes_to_hours(minutes: Decimal) -> Decimal {
    minutes / MINUTES_PER_HOUR
}

/// `part` as a percentage of `whole`, or `None` when `whole` is zero.
pub fn percent_of(
    part: Decimal,
    whole: Decimal,
) -> Option<Decimal> {
    part.checked_div(whole).map(|ratio| ratio * Decimal::ONE_HUNDRED)
}

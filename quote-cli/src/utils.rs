use quote_core::calculations::common::round_half_up;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a command-line amount cannot be parsed as a
/// [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid amount '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Parses an amount typed on the command line, accepting comma thousands
/// separators (`"1,234.56"`).
pub fn parse_amount(s: &str) -> Result<Decimal, ParseDecimalError> {
    s.trim().replace(',', "").parse().map_err(|e| {
        tracing::debug!(input = %s, "invalid amount: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Error returned for a malformed `<product_id>:<quantity>` order item.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid order item '{0}': expected <product_id>:<quantity>")]
pub struct ParseItemError(String);

/// Parses a sales-order item of the form `<product_id>:<quantity>`.
pub fn parse_order_item(s: &str) -> Result<(i64, i64), ParseItemError> {
    let err = || ParseItemError(s.to_string());
    let (id, qty) = s.split_once(':').ok_or_else(err)?;
    let id = id.trim().parse().map_err(|_| err())?;
    let qty = qty.trim().parse().map_err(|_| err())?;
    Ok((id, qty))
}

/// Rounds to 2 dp (half-up) and groups thousands: `1234.5` → `"1,234.50"`.
pub fn format_money(value: Decimal) -> String {
    let rounded = format!("{:.2}", round_half_up(value));
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{frac_part}")
}

/// Formats a percentage with up to two decimals and no trailing zeros.
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", round_half_up(value).normalize())
}

//! Money and rate columns are stored as SQLite REAL and read back as
//! [`Decimal`]. Hand-edited databases may hold INTEGER values in the same
//! columns, so both storage classes are accepted.

use quote_core::RepositoryError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{column}' not found: {e}")))?;

    if value_ref.is_null() {
        return Ok(Decimal::ZERO);
    }
    let type_name = value_ref.type_info().name().to_string();

    match type_name.as_str() {
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get INTEGER from '{column}': {e}"))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{column}': {e}"))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {val} to Decimal: {e}"))
            })
        }
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{other}' for column '{column}'"
        ))),
    }
}

pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Reads `(name, value)` rows into a map, for the settings and materials
/// tables.
pub fn collect_named<C>(
    rows: &[SqliteRow],
    name_column: &str,
    value_column: &str,
) -> Result<C, RepositoryError>
where
    C: FromIterator<(String, Decimal)>,
{
    rows.iter()
        .map(|row| {
            let name: String = row
                .try_get(name_column)
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
            Ok((name, get_decimal(row, value_column)?))
        })
        .collect()
}

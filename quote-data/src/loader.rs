use std::collections::BTreeMap;
use std::io::Read;

use quote_core::{QuoteRepository, RepositoryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MaterialLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Material name is empty on line {line}")]
    EmptyName { line: usize },

    #[error("Material '{name}' has a negative cost ({cost})")]
    NegativeCost { name: String, cost: Decimal },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for MaterialLoaderError {
    fn from(err: csv::Error) -> Self {
        MaterialLoaderError::CsvParse(err.to_string())
    }
}

/// One row of a material price list: `name,cost`.
///
/// Costs may use comma thousands separators (`"1,250"`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MaterialRecord {
    pub name: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub cost: Decimal,
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.trim()
        .replace(',', "")
        .parse::<Decimal>()
        .map_err(serde::de::Error::custom)
}

/// Bulk-loads material price lists through [`QuoteRepository`], so any
/// store backend can be targeted.
pub struct MaterialLoader;

impl MaterialLoader {
    /// Parses and validates a price list. Names are trimmed; blank names
    /// and negative costs are rejected.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<MaterialRecord>, MaterialLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: MaterialRecord = result?;
            if record.name.is_empty() {
                // Header is line 1.
                return Err(MaterialLoaderError::EmptyName { line: index + 2 });
            }
            if record.cost < Decimal::ZERO {
                return Err(MaterialLoaderError::NegativeCost {
                    name: record.name,
                    cost: record.cost,
                });
            }
            records.push(record);
        }

        debug!(count = records.len(), "price list parsed");
        Ok(records)
    }

    /// Upserts every record in one store write. When a name appears more
    /// than once the last row wins. Returns the number of distinct
    /// materials written.
    pub async fn load<R: QuoteRepository + ?Sized>(
        repo: &R,
        records: &[MaterialRecord],
    ) -> Result<usize, MaterialLoaderError> {
        let materials: BTreeMap<String, Decimal> = records
            .iter()
            .map(|record| (record.name.clone(), record.cost))
            .collect();

        repo.update_materials(&materials).await?;
        info!(count = materials.len(), "materials loaded");

        Ok(materials.len())
    }
}

//! Job files: a quote described in TOML.
//!
//! ```toml
//! job_name = "Bracket"
//! customer_name = "ACME"
//! material = "เหล็ก (Steel S45C)"
//! quantity = 2
//!
//! [[operations]]
//! method = "time"
//! description = "Turning"
//! hours = 2
//! rate = "Lathe"
//!
//! [[operations]]
//! method = "fixed"
//! description = "Heat treatment"
//! cost = "1,200"
//!
//! [[operations]]
//! method = "drill"
//! machine = "CNC"
//! cycle = "peck"
//! depth = 10
//! feed_rate = 150
//! rapid_rate = 5000
//! hole_count = 4
//! peck_depth = 3
//!
//! [[operations]]
//! method = "wire-edm"
//! length_mm = 400
//! thickness_mm = 20
//! ```
//!
//! Numbers may be written bare or quoted; quoted values accept comma
//! thousands separators like the form fields they replace.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use quote_core::calculations::estimators::{
    DrillCycle, DrillingParams, EstimateError, WireEdmMethod, parse_count_field,
    parse_decimal_field,
};
use quote_core::calculations::pricing::parse_quantity;
use quote_core::{LookupPolicy, MaterialTable, OperationParams, Quote, QuoteError, RateTable};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to read job file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid job file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("operation {index} ({description}): {source}")]
    Operation {
        index: usize,
        description: String,
        #[source]
        source: QuoteError,
    },

    #[error(transparent)]
    Quote(#[from] QuoteError),
}

/// A number as written in TOML: integer, float or string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

fn text(value: &Option<RawValue>) -> Option<String> {
    value.as_ref().map(RawValue::to_string)
}

fn decimal(
    field: &'static str,
    value: &RawValue,
) -> Result<Decimal, EstimateError> {
    parse_decimal_field(field, &value.to_string())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DrillMode {
    #[default]
    Simple,
    Dwell,
    Peck,
}

/// Drilling fields exactly as entered, shared by job files and the `drill`
/// command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrillInput {
    pub mode: DrillMode,
    pub depth: String,
    pub feed_rate: String,
    pub rapid_rate: Option<String>,
    pub hole_count: Option<String>,
    pub dwell_ms: Option<String>,
    pub peck_depth: Option<String>,
}

impl DrillInput {
    /// Parses every field, naming the first one that fails.
    ///
    /// A missing hole count means one hole. The rapid rate is only
    /// required by the peck cycle.
    pub fn to_params(&self) -> Result<DrillingParams, EstimateError> {
        let depth = parse_decimal_field("depth", &self.depth)?;
        let feed_rate = parse_decimal_field("feed_rate", &self.feed_rate)?;
        let hole_count = match &self.hole_count {
            Some(count) => parse_count_field("hole_count", count)?,
            None => 1,
        };

        let (cycle, rapid_rate) = match self.mode {
            DrillMode::Simple => (DrillCycle::Simple, Decimal::ZERO),
            DrillMode::Dwell => {
                let dwell_ms =
                    parse_decimal_field("dwell_ms", self.dwell_ms.as_deref().unwrap_or_default())?;
                (DrillCycle::Dwell { dwell_ms }, Decimal::ZERO)
            }
            DrillMode::Peck => {
                let peck_depth = parse_decimal_field(
                    "peck_depth",
                    self.peck_depth.as_deref().unwrap_or_default(),
                )?;
                let rapid_rate = parse_decimal_field(
                    "rapid_rate",
                    self.rapid_rate.as_deref().unwrap_or_default(),
                )?;
                (DrillCycle::Peck { peck_depth }, rapid_rate)
            }
        };

        Ok(DrillingParams {
            depth,
            feed_rate,
            rapid_rate,
            hole_count,
            cycle,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum JobOperation {
    Time {
        description: String,
        hours: RawValue,
        rate: String,
    },
    Fixed {
        description: String,
        cost: RawValue,
    },
    Drill {
        description: Option<String>,
        machine: String,
        #[serde(default)]
        cycle: DrillMode,
        depth: RawValue,
        feed_rate: RawValue,
        rapid_rate: Option<RawValue>,
        hole_count: Option<RawValue>,
        dwell_ms: Option<RawValue>,
        peck_depth: Option<RawValue>,
    },
    WireEdm {
        description: Option<String>,
        hours: Option<RawValue>,
        length_mm: Option<RawValue>,
        thickness_mm: Option<RawValue>,
    },
}

impl JobOperation {
    fn label(&self) -> &str {
        match self {
            Self::Time { description, .. } | Self::Fixed { description, .. } => description,
            Self::Drill { description, .. } => description.as_deref().unwrap_or("Drilling"),
            Self::WireEdm { description, .. } => description.as_deref().unwrap_or("Wire EDM"),
        }
    }

    fn book(
        &self,
        quote: &mut Quote,
        rates: &RateTable,
    ) -> Result<(), QuoteError> {
        let ledger = &mut quote.operations;
        match self {
            Self::Time {
                description,
                hours,
                rate,
            } => {
                let params = OperationParams::Time {
                    hours: decimal("hours", hours)?,
                    rate_name: rate.clone(),
                };
                ledger.add(description.as_str(), params, rates)?;
            }
            Self::Fixed { description, cost } => {
                let params = OperationParams::Fixed {
                    cost: decimal("cost", cost)?,
                };
                ledger.add(description.as_str(), params, rates)?;
            }
            Self::Drill {
                machine,
                cycle,
                depth,
                feed_rate,
                rapid_rate,
                hole_count,
                dwell_ms,
                peck_depth,
                ..
            } => {
                let input = DrillInput {
                    mode: *cycle,
                    depth: depth.to_string(),
                    feed_rate: feed_rate.to_string(),
                    rapid_rate: text(rapid_rate),
                    hole_count: text(hole_count),
                    dwell_ms: text(dwell_ms),
                    peck_depth: text(peck_depth),
                };
                let params = input.to_params()?;
                ledger.add_drilling(self.label(), machine, &params, rates)?;
            }
            Self::WireEdm {
                hours,
                length_mm,
                thickness_mm,
                ..
            } => {
                let method = wire_edm_method(hours.as_ref(), length_mm.as_ref(), thickness_mm.as_ref())?;
                ledger.add_wire_edm(self.label(), method, rates)?;
            }
        }
        Ok(())
    }
}

/// Picks the wire-EDM method from whichever fields were given. Hours win
/// when both forms are present.
pub fn wire_edm_method(
    hours: Option<&RawValue>,
    length_mm: Option<&RawValue>,
    thickness_mm: Option<&RawValue>,
) -> Result<WireEdmMethod, EstimateError> {
    match (hours, length_mm, thickness_mm) {
        (Some(hours), _, _) => Ok(WireEdmMethod::Hours(decimal("hours", hours)?)),
        (None, Some(length), Some(thickness)) => Ok(WireEdmMethod::Area {
            length_mm: decimal("length_mm", length)?,
            thickness_mm: decimal("thickness_mm", thickness)?,
        }),
        (None, None, _) => Err(EstimateError::invalid(
            "length_mm",
            "give either hours or length_mm and thickness_mm",
        )),
        (None, Some(_), None) => Err(EstimateError::invalid(
            "thickness_mm",
            "give either hours or length_mm and thickness_mm",
        )),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobFile {
    pub job_name: String,
    pub customer_name: String,
    /// Empty means the first material in the store.
    pub material: String,
    /// Missing means one piece.
    pub quantity: Option<RawValue>,
    pub notes: String,
    pub operations: Vec<JobOperation>,
}

impl JobFile {
    pub fn from_toml(text: &str) -> Result<Self, JobError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, JobError> {
        let text = fs::read_to_string(path).map_err(|source| JobError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let job = Self::from_toml(&text)?;
        debug!(path = %path.display(), operations = job.operations.len(), "job file loaded");
        Ok(job)
    }

    /// Builds the quote against a store snapshot, booking operations in
    /// file order. The first operation that fails aborts the build.
    pub fn build_quote(
        &self,
        rates: &RateTable,
        materials: &MaterialTable,
        policy: LookupPolicy,
    ) -> Result<Quote, JobError> {
        let quantity = parse_quantity(&text(&self.quantity).unwrap_or_default())?;
        let material = if self.material.trim().is_empty() {
            materials.first_name().unwrap_or_default().to_string()
        } else {
            self.material.trim().to_string()
        };

        let mut quote = Quote::new(&self.job_name, &self.customer_name, material, quantity);
        quote.notes = self.notes.clone();
        quote.operations = quote_core::OperationLedger::with_policy(policy);

        for (index, operation) in self.operations.iter().enumerate() {
            operation
                .book(&mut quote, rates)
                .map_err(|source| JobError::Operation {
                    index: index + 1,
                    description: operation.label().to_string(),
                    source,
                })?;
        }

        info!(
            job = %quote.job_name,
            operations = quote.operations.len(),
            "quote built from job file"
        );
        Ok(quote)
    }
}

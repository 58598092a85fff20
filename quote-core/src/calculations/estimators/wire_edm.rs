//! Wire-EDM cycle-time estimation.
//!
//! Two ways to arrive at machine hours:
//!
//! * **Hours**: the operator already knows the burn time; it is passed
//!   through unchanged.
//! * **Area**: the cut area (`length × thickness`, mm²) is priced at the
//!   shop's area rate and converted back into hours with the `Wire EDM`
//!   machine rate, so the resulting TIME operation reproduces the area cost.
//!   Without a stored `Wire EDM` rate the conversion uses
//!   [`DEFAULT_WIRE_EDM_HOURLY_RATE`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EstimateError, in_range, require_non_negative};
use crate::models::{DEFAULT_WIRE_EDM_HOURLY_RATE, RateTable, WIRE_EDM_MACHINE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireEdmMethod {
    Hours(Decimal),
    Area {
        length_mm: Decimal,
        thickness_mm: Decimal,
    },
}

impl WireEdmMethod {
    pub fn describe(&self) -> String {
        match self {
            Self::Hours(hours) => format!("wire EDM {hours} h"),
            Self::Area {
                length_mm,
                thickness_mm,
            } => format!("wire EDM cut {length_mm} mm x {thickness_mm} mm"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEdmEstimate {
    pub hours: Decimal,
    /// Area cost; `None` for the pass-through method.
    pub cost: Option<Decimal>,
}

/// Rates the area method needs, taken from the session's rate snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireEdmEstimator {
    pub hourly_rate: Decimal,
    pub area_rate: Decimal,
}

impl WireEdmEstimator {
    pub fn new(
        hourly_rate: Decimal,
        area_rate: Decimal,
    ) -> Self {
        Self {
            hourly_rate,
            area_rate,
        }
    }

    /// Uses the `Wire EDM` machine rate and the table's area rate. A stored
    /// rate of zero is kept as is.
    pub fn from_rates(rates: &RateTable) -> Self {
        Self::new(
            rates.rate(WIRE_EDM_MACHINE).unwrap_or(DEFAULT_WIRE_EDM_HOURLY_RATE),
            rates.wire_edm_area_rate,
        )
    }

    /// # Errors
    ///
    /// * [`EstimateError::InvalidInput`] for negative hours or dimensions, or
    ///   a cut too large to price.
    /// * [`EstimateError::DivisionByZero`] when the area method is used and
    ///   the hourly rate is zero.
    pub fn estimate(
        &self,
        method: WireEdmMethod,
    ) -> Result<WireEdmEstimate, EstimateError> {
        match method {
            WireEdmMethod::Hours(hours) => Ok(WireEdmEstimate {
                hours: require_non_negative("hours", hours)?,
                cost: None,
            }),
            WireEdmMethod::Area {
                length_mm,
                thickness_mm,
            } => {
                let length = require_non_negative("length_mm", length_mm)?;
                let thickness = require_non_negative("thickness_mm", thickness_mm)?;
                if self.hourly_rate.is_zero() {
                    return Err(EstimateError::DivisionByZero {
                        field: "hourly_rate",
                    });
                }
                let area = in_range("length_mm", length.checked_mul(thickness))?;
                let cost = in_range("area_rate", area.checked_mul(self.area_rate))?;
                Ok(WireEdmEstimate {
                    hours: in_range("hourly_rate", cost.checked_div(self.hourly_rate))?,
                    cost: Some(cost),
                })
            }
        }
    }
}

//! Drilling cycle-time estimation for the three canned drilling cycles.
//!
//! | Cycle | G-code | Time per hole |
//! |-------|--------|---------------|
//! | Simple | G81 | `depth / feed_rate` |
//! | Dwell  | G82 | `depth / feed_rate + dwell_ms / 60000` |
//! | Peck   | G83 | `depth / feed_rate + rapid_distance / rapid_rate` |
//!
//! The peck cycle is simulated: the tool advances by `min(peck_depth,
//! remaining)` per peck and, after every peck except the last, rapids back
//! to the surface and down again to the depth it had reached. Each of those
//! round trips adds `depth_after + depth_before` of rapid travel. A peck
//! depth that would need more than [`MAX_PECKS_PER_HOLE`] pecks is rejected.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use quote_core::calculations::estimators::{DrillCycle, DrillingParams, estimate_drilling};
//!
//! let params = DrillingParams {
//!     depth: dec!(10),
//!     feed_rate: dec!(150),
//!     rapid_rate: dec!(5000),
//!     hole_count: 1,
//!     cycle: DrillCycle::Peck { peck_depth: dec!(3) },
//! };
//!
//! let estimate = estimate_drilling(&params).unwrap();
//!
//! assert_eq!(estimate.peck_count, 4);
//! assert_eq!(estimate.last_peck, dec!(1));
//! assert_eq!(estimate.rapid_distance, dec!(27));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EstimateError, in_range, require_non_negative, require_positive};

/// Remaining depth below which the peck simulation stops.
pub const PECK_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Upper bound on `ceil(depth / peck_depth)` for one hole.
pub const MAX_PECKS_PER_HOLE: u32 = 10_000;

const MS_PER_MINUTE: Decimal = Decimal::from_parts(60_000, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrillCycle {
    /// Straight feed to depth (G81).
    Simple,
    /// Feed to depth and dwell at the bottom (G82).
    Dwell { dwell_ms: Decimal },
    /// Incremental pecking with full retracts (G83).
    Peck { peck_depth: Decimal },
}

impl DrillCycle {
    pub fn gcode(&self) -> &'static str {
        match self {
            Self::Simple => "G81",
            Self::Dwell { .. } => "G82",
            Self::Peck { .. } => "G83",
        }
    }
}

/// Inputs for [`estimate_drilling`]. Lengths in mm, rates in mm/min.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillingParams {
    pub depth: Decimal,
    pub feed_rate: Decimal,
    /// Only read by the peck cycle.
    pub rapid_rate: Decimal,
    pub hole_count: u32,
    pub cycle: DrillCycle,
}

impl DrillingParams {
    /// Short human-readable summary used as the operation description.
    pub fn describe(&self) -> String {
        let gcode = self.cycle.gcode();
        match self.cycle {
            DrillCycle::Simple => format!(
                "{gcode} x{} depth {} feed {}",
                self.hole_count, self.depth, self.feed_rate
            ),
            DrillCycle::Dwell { dwell_ms } => format!(
                "{gcode} x{} depth {} dwell {} ms",
                self.hole_count, self.depth, dwell_ms
            ),
            DrillCycle::Peck { peck_depth } => format!(
                "{gcode} x{} depth {} peck {}",
                self.hole_count, self.depth, peck_depth
            ),
        }
    }
}

/// Result of a drilling estimate. All times are in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillingEstimate {
    pub feed_time_per_hole: Decimal,
    pub dwell_time_per_hole: Decimal,
    /// Rapid travel per hole in mm. Zero unless the cycle is a peck cycle.
    pub rapid_distance: Decimal,
    pub rapid_time_per_hole: Decimal,
    /// Feed moves per hole; 1 for the simple and dwell cycles.
    pub peck_count: u32,
    /// Depth advanced by the final feed move.
    pub last_peck: Decimal,
    pub total_minutes: Decimal,
}

/// Estimates the machining time for `params.hole_count` identical holes.
///
/// # Errors
///
/// Returns [`EstimateError::InvalidInput`] when the depth, feed rate or
/// hole count is not positive, when the dwell is negative, or, for the peck
/// cycle, when the peck depth or rapid rate is not positive or the peck depth
/// is too small for [`MAX_PECKS_PER_HOLE`]. A time that does not fit in a
/// `Decimal` is reported against the field that pushed it out of range.
pub fn estimate_drilling(params: &DrillingParams) -> Result<DrillingEstimate, EstimateError> {
    let depth = require_positive("depth", params.depth)?;
    let feed_rate = require_positive("feed_rate", params.feed_rate)?;
    if params.hole_count == 0 {
        return Err(EstimateError::invalid("hole_count", "must be at least 1"));
    }
    let hole_count = Decimal::from(params.hole_count);

    let feed_time_per_hole = in_range("feed_rate", depth.checked_div(feed_rate))?;

    let estimate = match params.cycle {
        DrillCycle::Simple => DrillingEstimate {
            feed_time_per_hole,
            dwell_time_per_hole: Decimal::ZERO,
            rapid_distance: Decimal::ZERO,
            rapid_time_per_hole: Decimal::ZERO,
            peck_count: 1,
            last_peck: depth,
            total_minutes: in_range("hole_count", feed_time_per_hole.checked_mul(hole_count))?,
        },
        DrillCycle::Dwell { dwell_ms } => {
            let dwell_minutes = require_non_negative("dwell_ms", dwell_ms)? / MS_PER_MINUTE;
            let per_hole = in_range("dwell_ms", feed_time_per_hole.checked_add(dwell_minutes))?;
            DrillingEstimate {
                feed_time_per_hole,
                dwell_time_per_hole: dwell_minutes,
                rapid_distance: Decimal::ZERO,
                rapid_time_per_hole: Decimal::ZERO,
                peck_count: 1,
                last_peck: depth,
                total_minutes: in_range("hole_count", per_hole.checked_mul(hole_count))?,
            }
        }
        DrillCycle::Peck { peck_depth } => {
            let peck_depth = require_positive("peck_depth", peck_depth)?;
            let rapid_rate = require_positive("rapid_rate", params.rapid_rate)?;
            let planned = in_range("peck_depth", depth.checked_div(peck_depth))?.ceil();
            if planned > Decimal::from(MAX_PECKS_PER_HOLE) {
                return Err(EstimateError::invalid(
                    "peck_depth",
                    format!("needs more than {MAX_PECKS_PER_HOLE} pecks per hole"),
                ));
            }
            let pecks = simulate_pecks(depth, peck_depth)?;
            let rapid_time_per_hole =
                in_range("rapid_rate", pecks.rapid_distance.checked_div(rapid_rate))?;
            let per_hole =
                in_range("rapid_rate", feed_time_per_hole.checked_add(rapid_time_per_hole))?;
            DrillingEstimate {
                feed_time_per_hole,
                dwell_time_per_hole: Decimal::ZERO,
                rapid_distance: pecks.rapid_distance,
                rapid_time_per_hole,
                peck_count: pecks.count,
                last_peck: pecks.last,
                total_minutes: in_range("hole_count", per_hole.checked_mul(hole_count))?,
            }
        }
    };

    Ok(estimate)
}

struct PeckWalk {
    count: u32,
    last: Decimal,
    rapid_distance: Decimal,
}

/// Walks the peck sequence for one hole, accumulating the rapid
/// retract/re-approach distance.
fn simulate_pecks(
    depth: Decimal,
    peck_depth: Decimal,
) -> Result<PeckWalk, EstimateError> {
    let mut walk = PeckWalk {
        count: 0,
        last: Decimal::ZERO,
        rapid_distance: Decimal::ZERO,
    };
    let mut drilled = Decimal::ZERO;
    let mut remaining = depth;

    while remaining > PECK_EPSILON {
        let peck = peck_depth.min(remaining);
        let depth_after = drilled + peck;
        remaining -= peck;
        if remaining > PECK_EPSILON {
            let round_trip = in_range("depth", depth_after.checked_add(drilled))?;
            walk.rapid_distance = in_range("depth", walk.rapid_distance.checked_add(round_trip))?;
        }
        walk.count += 1;
        walk.last = peck;
        drilled = depth_after;
    }

    Ok(walk)
}

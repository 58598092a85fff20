use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settings key holding the profit margin fraction.
pub const PROFIT_MARGIN_KEY: &str = "profit_margin";

/// Settings key holding the wire-EDM cost per square millimetre.
pub const WIRE_EDM_AREA_RATE_KEY: &str = "Wire EDM_sqmm";

/// Machine whose hourly rate converts wire-EDM area cost back into hours.
pub const WIRE_EDM_MACHINE: &str = "Wire EDM";

/// Hourly rate the wire-EDM area method converts with when the store has no
/// `Wire EDM` entry.
pub const DEFAULT_WIRE_EDM_HOURLY_RATE: Decimal = Decimal::from_parts(950, 0, 0, false, 0);

/// Margin used when the store has no `profit_margin` entry.
pub const DEFAULT_PROFIT_MARGIN: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

/// Area rate used when the store has no `Wire EDM_sqmm` entry.
pub const DEFAULT_WIRE_EDM_AREA_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Machine hourly rates plus the two scalar pricing settings.
///
/// The store keeps all of these in one flat key/value table; every key that
/// is not one of the distinguished settings is a machine name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub hourly_rates: BTreeMap<String, Decimal>,
    pub profit_margin: Decimal,
    pub wire_edm_area_rate: Decimal,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            hourly_rates: BTreeMap::new(),
            profit_margin: DEFAULT_PROFIT_MARGIN,
            wire_edm_area_rate: DEFAULT_WIRE_EDM_AREA_RATE,
        }
    }
}

impl RateTable {
    /// Splits a flat settings mapping into machine rates and scalar settings.
    pub fn from_settings(settings: &HashMap<String, Decimal>) -> Self {
        let mut table = Self::default();
        for (key, value) in settings {
            match key.as_str() {
                PROFIT_MARGIN_KEY => table.profit_margin = *value,
                WIRE_EDM_AREA_RATE_KEY => table.wire_edm_area_rate = *value,
                _ => {
                    table.hourly_rates.insert(key.clone(), *value);
                }
            }
        }
        table
    }

    /// Flattens the table back into the store's key/value layout.
    pub fn to_settings(&self) -> HashMap<String, Decimal> {
        let mut settings: HashMap<String, Decimal> = self
            .hourly_rates
            .iter()
            .map(|(name, rate)| (name.clone(), *rate))
            .collect();
        settings.insert(PROFIT_MARGIN_KEY.to_string(), self.profit_margin);
        settings.insert(WIRE_EDM_AREA_RATE_KEY.to_string(), self.wire_edm_area_rate);
        settings
    }

    pub fn rate(&self, machine: &str) -> Option<Decimal> {
        self.hourly_rates.get(machine).copied()
    }

    /// Machine names in display order (alphabetical).
    pub fn machines(&self) -> impl Iterator<Item = &str> {
        self.hourly_rates.keys().map(String::as_str)
    }
}

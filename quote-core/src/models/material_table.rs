use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of material unit costs keyed by material name.
///
/// Names are compared exactly (no case folding or trimming), so names in
/// any script are matched as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialTable {
    costs: BTreeMap<String, Decimal>,
}

impl MaterialTable {
    pub fn new(costs: BTreeMap<String, Decimal>) -> Self {
        Self { costs }
    }

    pub fn cost(&self, name: &str) -> Option<Decimal> {
        self.costs.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.costs.keys().map(String::as_str)
    }

    /// First material in display order, used as the default selection.
    pub fn first_name(&self) -> Option<&str> {
        self.names().next()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.costs.iter().map(|(name, cost)| (name.as_str(), *cost))
    }
}

impl From<BTreeMap<String, Decimal>> for MaterialTable {
    fn from(costs: BTreeMap<String, Decimal>) -> Self {
        Self::new(costs)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn cost_matches_non_ascii_names_exactly() {
        let table = MaterialTable::new(BTreeMap::from([
            ("เหล็ก (Steel S45C)".to_string(), dec!(80)),
            ("ทองเหลือง (Brass)".to_string(), dec!(300)),
        ]));

        assert_eq!(table.cost("เหล็ก (Steel S45C)"), Some(dec!(80)));
        assert_eq!(table.cost("Steel S45C"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn first_name_is_none_for_empty_table() {
        assert_eq!(MaterialTable::default().first_name(), None);
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// How rate and material names that are missing from the session snapshot
/// are priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupPolicy {
    /// Price the missing entry at zero and record the miss.
    #[default]
    Lenient,
    /// Refuse to price anything that references a missing entry.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupKind {
    Rate,
    Material,
}

impl fmt::Display for LookupKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Rate => write!(f, "rate"),
            Self::Material => write!(f, "material"),
        }
    }
}

/// A name that did not resolve and was priced as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupMiss {
    pub kind: LookupKind,
    pub name: String,
}

impl fmt::Display for LookupMiss {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "unknown {} '{}' priced as 0", self.kind, self.name)
    }
}

use rust_decimal::Decimal;
use tracing::warn;

use super::pricing::QuoteError;
use crate::models::{LookupKind, LookupMiss, LookupPolicy};

/// Applies `policy` to the outcome of a rate or material lookup.
///
/// A hit returns the value. A miss fails under [`LookupPolicy::Strict`];
/// under [`LookupPolicy::Lenient`] it prices as zero, is logged, and is
/// returned so the caller can record it.
pub(crate) fn resolve(
    policy: LookupPolicy,
    kind: LookupKind,
    name: &str,
    found: Option<Decimal>,
) -> Result<(Decimal, Option<LookupMiss>), QuoteError> {
    if let Some(value) = found {
        return Ok((value, None));
    }

    match (policy, kind) {
        (LookupPolicy::Strict, LookupKind::Rate) => Err(QuoteError::UnknownRate(name.to_string())),
        (LookupPolicy::Strict, LookupKind::Material) => {
            Err(QuoteError::UnknownMaterial(name.to_string()))
        }
        (LookupPolicy::Lenient, _) => {
            let miss = LookupMiss {
                kind,
                name: name.to_string(),
            };
            warn!(kind = %kind, name, "{miss}");
            Ok((Decimal::ZERO, Some(miss)))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn hit_is_returned_under_either_policy() {
        for policy in [LookupPolicy::Lenient, LookupPolicy::Strict] {
            let result = resolve(policy, LookupKind::Rate, "Lathe", Some(dec!(550)));

            assert_eq!(result, Ok((dec!(550), None)));
        }
    }

    #[test]
    fn lenient_miss_prices_as_zero_and_is_recorded() {
        let result = resolve(LookupPolicy::Lenient, LookupKind::Material, "Titanium", None);

        assert_eq!(
            result,
            Ok((
                Decimal::ZERO,
                Some(LookupMiss {
                    kind: LookupKind::Material,
                    name: "Titanium".to_string(),
                })
            ))
        );
    }

    #[test]
    fn strict_miss_names_the_lookup() {
        assert_eq!(
            resolve(LookupPolicy::Strict, LookupKind::Rate, "Laser", None),
            Err(QuoteError::UnknownRate("Laser".to_string()))
        );
        assert_eq!(
            resolve(LookupPolicy::Strict, LookupKind::Material, "Titanium", None),
            Err(QuoteError::UnknownMaterial("Titanium".to_string()))
        );
    }
}

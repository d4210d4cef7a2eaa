//! Display-side projections of market probabilities.
//!
//! Nothing here feeds back into pricing: these helpers round for
//! presentation, compare current and post-trade probabilities, and map
//! scalar markets back onto their value range.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::aggregator::{MarketProbabilities, MarketProbability};
use super::error::{InvalidStateError, Result};
use super::market::PositionSpace;
use super::math::MathContext;

/// Default threshold, in percentage points, above which a change is shown.
pub const DEFAULT_SIGNIFICANT_CHANGE_PCT: Decimal = dec!(0.01);

/// Movement of one outcome's probability caused by a staged trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbabilityChange {
    pub before: Decimal,
    pub after: Decimal,
    /// `(after − before) · 100`, rounded to display places.
    pub change_pct: Decimal,
    /// Whether `|change_pct|` exceeds the significance threshold.
    pub significant: bool,
}

/// Rounds every available probability to the context's display places.
pub fn round_for_display(probabilities: &MarketProbabilities, ctx: &MathContext) -> Vec<MarketProbability> {
    probabilities
        .iter()
        .map(|market| match market {
            MarketProbability::Available(p) => {
                MarketProbability::Available(p.iter().map(|&v| ctx.round_display(v)).collect())
            }
            MarketProbability::Unavailable => MarketProbability::Unavailable,
        })
        .collect()
}

/// Compares probabilities before and after a staged trade.
///
/// Returns one entry per market; `None` where either side is unavailable.
pub fn probability_changes(
    before: &MarketProbabilities,
    after: &MarketProbabilities,
    threshold_pct: Decimal,
    ctx: &MathContext,
) -> Result<Vec<Option<Vec<ProbabilityChange>>>> {
    if before.len() != after.len() {
        return Err(InvalidStateError::ProbabilityLengthMismatch {
            expected: before.len(),
            actual: after.len(),
        }
        .into());
    }

    before
        .iter()
        .zip(after.iter())
        .map(|(b, a)| match (b.as_available(), a.as_available()) {
            (Some(b), Some(a)) => {
                if b.len() != a.len() {
                    return Err(InvalidStateError::ProbabilityLengthMismatch {
                        expected: b.len(),
                        actual: a.len(),
                    }
                    .into());
                }
                b.iter()
                    .zip(a)
                    .map(|(&before, &after)| {
                        let change = ctx.mul(ctx.sub(after, before)?, Decimal::ONE_HUNDRED)?;
                        let change_pct = ctx.round_display(change);
                        Ok(ProbabilityChange {
                            before,
                            after,
                            change_pct,
                            significant: ctx.abs(change_pct) > threshold_pct,
                        })
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Some)
            }
            _ => Ok(None),
        })
        .collect()
}

/// Implied value of a scalar market: `lower + p₀ · (upper − lower)`.
///
/// Returns `Ok(None)` when the market's probabilities are unavailable.
pub fn implied_scalar_value(
    space: &PositionSpace,
    market: usize,
    probabilities: &MarketProbabilities,
    ctx: &MathContext,
) -> Result<Option<Decimal>> {
    let bounds = space.market(market)?.scalar_bounds()?;
    match probabilities.get(market).and_then(MarketProbability::as_available) {
        Some(p) => bounds.value_at(ctx, p[0]).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregator::aggregate;
    use crate::domain::market::tests::categorical;
    use crate::domain::market::{MarketDefinition, OutcomeDefinition, ScalarBounds};

    fn binary() -> PositionSpace {
        PositionSpace::new(vec![categorical("a", &["y", "n"])]).unwrap()
    }

    #[test]
    fn test_changes_flag_significant_moves() {
        let ctx = MathContext::default();
        let space = binary();
        let before = aggregate(&space, None, &[dec!(0.5), dec!(0.5)], &ctx).unwrap();
        let after = aggregate(&space, None, &[dec!(0.55), dec!(0.45)], &ctx).unwrap();

        let changes = probability_changes(&before, &after, DEFAULT_SIGNIFICANT_CHANGE_PCT, &ctx)
            .unwrap();
        let market = changes[0].as_ref().unwrap();
        assert_eq!(market[0].change_pct, dec!(5));
        assert_eq!(market[1].change_pct, dec!(-5));
        assert!(market[0].significant && market[1].significant);
    }

    #[test]
    fn test_tiny_changes_are_not_significant() {
        let ctx = MathContext::default();
        let space = binary();
        let before = aggregate(&space, None, &[dec!(0.5), dec!(0.5)], &ctx).unwrap();
        let after = aggregate(&space, None, &[dec!(0.50004), dec!(0.49996)], &ctx).unwrap();

        let changes = probability_changes(&before, &after, DEFAULT_SIGNIFICANT_CHANGE_PCT, &ctx)
            .unwrap();
        let market = changes[0].as_ref().unwrap();
        assert_eq!(market[0].change_pct, dec!(0.004));
        assert!(!market[0].significant);
    }

    #[test]
    fn test_round_for_display() {
        let ctx = MathContext::default();
        let space = binary();
        let probs = aggregate(&space, None, &[dec!(1), dec!(2)], &ctx).unwrap();
        let rounded = round_for_display(&probs, &ctx);
        assert_eq!(
            rounded[0],
            MarketProbability::Available(vec![dec!(0.3333), dec!(0.6667)])
        );
    }

    #[test]
    fn test_implied_scalar_value() {
        let ctx = MathContext::default();
        let space = PositionSpace::new(vec![MarketDefinition {
            key: "temp".to_string(),
            title: "Temperature".to_string(),
            outcomes: vec![
                OutcomeDefinition {
                    title: "Long".to_string(),
                    short: "long".to_string(),
                },
                OutcomeDefinition {
                    title: "Short".to_string(),
                    short: "short".to_string(),
                },
            ],
            bounds: Some(ScalarBounds {
                lower: dec!(0),
                upper: dec!(40),
                unit: Some("°C".to_string()),
            }),
        }])
        .unwrap();
        let probs = aggregate(&space, None, &[dec!(3), dec!(1)], &ctx).unwrap();
        assert_eq!(implied_scalar_value(&space, 0, &probs, &ctx).unwrap(), Some(dec!(30)));

        let categorical_space = binary();
        assert!(implied_scalar_value(&categorical_space, 0, &probs, &ctx)
            .unwrap_err()
            .is_invalid_input());
    }
}

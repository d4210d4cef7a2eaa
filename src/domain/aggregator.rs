//! Position aggregator.
//!
//! Projects a position-probability vector onto each market's outcomes.
//! Markets whose selection is `Conditioning(k)` restrict every other
//! market's sum to positions assigning `k` to them; the surviving mass is
//! renormalized so each market's vector sums to one.
//!
//! Summation runs in ascending position index. That order is part of the
//! contract: two implementations fed the same inputs produce the same
//! digits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{InvalidInputError, InvalidStateError, Result};
use super::market::PositionSpace;
use super::math::MathContext;
use super::selection::{validate_selections, MarketSelection};

/// Outcome probabilities of one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "probabilities", rename_all = "snake_case")]
pub enum MarketProbability {
    /// One probability per outcome, in outcome order.
    Available(Vec<Decimal>),
    /// The conditioning set carries no probability mass.
    Unavailable,
}

impl MarketProbability {
    pub fn as_available(&self) -> Option<&[Decimal]> {
        match self {
            Self::Available(probabilities) => Some(probabilities.as_slice()),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Per-market probabilities, indexed by market index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketProbabilities(Vec<MarketProbability>);

impl MarketProbabilities {
    pub fn get(&self, market: usize) -> Option<&MarketProbability> {
        self.0.get(market)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarketProbability> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<MarketProbability> {
        self.0
    }
}

/// Computes every market's outcome probabilities.
///
/// `selections` of `None` means no conditioning: every market gets its
/// marginal distribution.
///
/// # Errors
/// - `InvalidStateError::ProbabilityLengthMismatch` if the vector length is not `N`
/// - `InvalidInputError` for negative probabilities or malformed selections
pub fn aggregate(
    space: &PositionSpace,
    selections: Option<&[MarketSelection]>,
    position_probabilities: &[Decimal],
    ctx: &MathContext,
) -> Result<MarketProbabilities> {
    if position_probabilities.len() != space.len() {
        return Err(InvalidStateError::ProbabilityLengthMismatch {
            expected: space.len(),
            actual: position_probabilities.len(),
        }
        .into());
    }
    if let Some((index, value)) = position_probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| p.is_sign_negative() && !p.is_zero())
    {
        return Err(InvalidInputError::NegativeProbability {
            index,
            value: *value,
        }
        .into());
    }

    let conditions: Vec<(usize, usize)> = match selections {
        Some(selections) => {
            validate_selections(space, selections)?;
            selections
                .iter()
                .enumerate()
                .filter_map(|(market, s)| s.conditioning_outcome().map(|o| (market, o)))
                .collect()
        }
        None => Vec::new(),
    };

    space
        .markets()
        .iter()
        .map(|market| {
            let mut masses = vec![Decimal::ZERO; market.outcome_count()];
            let mut total = Decimal::ZERO;

            for (position, &probability) in space.positions().iter().zip(position_probabilities) {
                let consistent = conditions
                    .iter()
                    .all(|&(m, o)| m == market.index || position.outcome_for(m) == o);
                if !consistent {
                    continue;
                }
                let outcome = position.outcome_for(market.index);
                masses[outcome] = ctx.add(masses[outcome], probability)?;
                total = ctx.add(total, probability)?;
            }

            if total.is_zero() {
                return Ok(MarketProbability::Unavailable);
            }
            masses
                .into_iter()
                .map(|mass| ctx.div(mass, total))
                .collect::<Result<Vec<_>>>()
                .map(MarketProbability::Available)
        })
        .collect::<Result<Vec<_>>>()
        .map(MarketProbabilities)
}

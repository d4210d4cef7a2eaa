//! Markets, outcomes and the combinatorial position space.
//!
//! A position is one cell of the cross product of every market's
//! outcomes. Positions are generated once from the market catalog and
//! their dense indices align with the LMSR balance and probability
//! vectors. The first market's outcome varies fastest:
//!
//! `index = Σ outcome_m · ∏_{m' < m} |outcomes_m'|`

use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{DomainError, InvalidInputError, InvalidStateError, Result};
use super::math::MathContext;

/// Catalog entry for one outcome, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeDefinition {
    pub title: String,
    pub short: String,
}

/// Catalog entry for one market, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDefinition {
    pub key: String,
    pub title: String,
    pub outcomes: Vec<OutcomeDefinition>,
    #[serde(default)]
    pub bounds: Option<ScalarBounds>,
}

/// Value range of a scalar market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarBounds {
    pub lower: Decimal,
    pub upper: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ScalarBounds {
    /// Checks that the range is non-empty.
    pub fn validate(&self) -> std::result::Result<(), InvalidStateError> {
        if self.upper <= self.lower {
            return Err(InvalidStateError::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// Implied scalar value: `lower + p · (upper − lower)`.
    pub fn value_at(&self, ctx: &MathContext, probability: Decimal) -> Result<Decimal> {
        self.validate()?;
        let span = ctx.sub(self.upper, self.lower)?;
        ctx.add(self.lower, ctx.mul(probability, span)?)
    }

    /// Inverse of [`value_at`](Self::value_at): `(value − lower) / (upper − lower)`.
    pub fn probability_at(&self, ctx: &MathContext, value: Decimal) -> Result<Decimal> {
        self.validate()?;
        if value < self.lower || value > self.upper {
            return Err(InvalidInputError::ValueOutOfBounds {
                value,
                lower: self.lower,
                upper: self.upper,
            }
            .into());
        }
        ctx.div(ctx.sub(value, self.lower)?, ctx.sub(self.upper, self.lower)?)
    }
}

/// One outcome slot of a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub title: String,
    pub short: String,
    /// Slot index within the owning market.
    pub index: usize,
    /// Indices of the positions that include this outcome.
    pub positions: Vec<usize>,
}

/// One trading dimension. Immutable once the position space is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Market {
    pub key: String,
    pub title: String,
    pub index: usize,
    pub outcomes: Vec<Outcome>,
    pub bounds: Option<ScalarBounds>,
}

impl Market {
    pub fn outcome_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.bounds.is_some()
    }

    /// Scalar bounds, or an error for categorical markets.
    pub fn scalar_bounds(&self) -> std::result::Result<&ScalarBounds, InvalidInputError> {
        self.bounds
            .as_ref()
            .ok_or_else(|| InvalidInputError::NotScalar(self.key.clone()))
    }
}

/// Stable identifier of a position, built from its outcome codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionId(String);

impl PositionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (market, outcome) pair chosen by a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OutcomeRef {
    pub market: usize,
    pub outcome: usize,
}

/// One atomic cell of the outcome cross product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub id: PositionId,
    pub index: usize,
    /// One entry per market, in market order.
    pub outcomes: Vec<OutcomeRef>,
}

impl Position {
    /// Outcome index this position assigns to `market`.
    pub fn outcome_for(&self, market: usize) -> usize {
        self.outcomes[market].outcome
    }
}

/// Markets together with every position of their cross product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionSpace {
    markets: Vec<Market>,
    positions: Vec<Position>,
}

impl PositionSpace {
    /// Builds the position space from a market catalog.
    ///
    /// # Errors
    /// `InvalidStateError` if the catalog is empty, a market has no
    /// outcomes, keys repeat, or scalar bounds are inverted.
    pub fn new(definitions: Vec<MarketDefinition>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(InvalidStateError::EmptyPositions.into());
        }

        let mut seen = HashSet::new();
        let mut count: usize = 1;
        for def in &definitions {
            if def.outcomes.is_empty() {
                return Err(InvalidStateError::MarketWithoutOutcomes {
                    market: def.key.clone(),
                }
                .into());
            }
            if !seen.insert(def.key.as_str()) {
                return Err(InvalidStateError::DuplicateMarketKey(def.key.clone()).into());
            }
            if let Some(bounds) = &def.bounds {
                bounds.validate()?;
            }
            count = count
                .checked_mul(def.outcomes.len())
                .ok_or(DomainError::Overflow("position count"))?;
        }

        let mut markets: Vec<Market> = definitions
            .into_iter()
            .enumerate()
            .map(|(index, def)| Market {
                key: def.key,
                title: def.title,
                index,
                outcomes: def
                    .outcomes
                    .into_iter()
                    .enumerate()
                    .map(|(index, o)| Outcome {
                        title: o.title,
                        short: o.short,
                        index,
                        positions: Vec::new(),
                    })
                    .collect(),
                bounds: def.bounds,
            })
            .collect();

        let mut positions = Vec::with_capacity(count);
        for index in 0..count {
            let mut rest = index;
            let mut outcomes = Vec::with_capacity(markets.len());
            for market in &markets {
                let radix = market.outcome_count();
                outcomes.push(OutcomeRef {
                    market: market.index,
                    outcome: rest % radix,
                });
                rest /= radix;
            }
            let id = outcomes
                .iter()
                .map(|r| {
                    let market = &markets[r.market];
                    format!("{}:{}", market.key, market.outcomes[r.outcome].short)
                })
                .collect::<Vec<_>>()
                .join("|");
            positions.push(Position {
                id: PositionId(id),
                index,
                outcomes,
            });
        }

        for position in &positions {
            for r in &position.outcomes {
                markets[r.market].outcomes[r.outcome]
                    .positions
                    .push(position.index);
            }
        }

        Ok(Self { markets, positions })
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn market(&self, index: usize) -> std::result::Result<&Market, InvalidInputError> {
        self.markets
            .get(index)
            .ok_or(InvalidInputError::MarketIndexOutOfRange(index))
    }

    /// Number of markets.
    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    /// Number of positions, `N = ∏ |outcomes|`. Always at least one.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Dense index of the position choosing `assignment[m]` in market `m`.
    pub fn position_index(&self, assignment: &[usize]) -> Result<usize> {
        if assignment.len() != self.markets.len() {
            return Err(InvalidInputError::SelectionLengthMismatch {
                expected: self.markets.len(),
                actual: assignment.len(),
            }
            .into());
        }
        let mut index = 0;
        let mut stride = 1;
        for (market, &outcome) in self.markets.iter().zip(assignment) {
            if outcome >= market.outcome_count() {
                return Err(InvalidInputError::OutcomeIndexOutOfRange {
                    market: market.index,
                    outcomes: market.outcome_count(),
                    index: outcome,
                }
                .into());
            }
            index += outcome * stride;
            stride *= market.outcome_count();
        }
        Ok(index)
    }

    /// Checks per-market outcome slot counts reported by the chain.
    pub fn verify_outcome_slot_counts(&self, reported: &[usize]) -> Result<()> {
        if reported.len() != self.markets.len() {
            return Err(InvalidStateError::SlotCountLengthMismatch {
                expected: self.markets.len(),
                actual: reported.len(),
            }
            .into());
        }
        for (market, &slots) in self.markets.iter().zip(reported) {
            if slots != market.outcome_count() {
                return Err(InvalidStateError::OutcomeSlotMismatch {
                    market: market.key.clone(),
                    expected: market.outcome_count(),
                    reported: slots,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Checks the total atomic outcome slot count reported by the chain.
    pub fn verify_atomic_outcome_slot_count(&self, reported: usize) -> Result<()> {
        if reported != self.len() {
            return Err(InvalidStateError::AtomicSlotMismatch {
                expected: self.len(),
                reported,
            }
            .into());
        }
        Ok(())
    }
}

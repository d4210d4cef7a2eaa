//! Per-market user selection.
//!
//! The selection store hands over `{ selectedOutcomeIndex, isAssumed }`
//! pairs; internally they become a single tagged variant so an assumed
//! market without an outcome cannot be represented.

use serde::{Deserialize, Serialize};

use super::error::{InvalidInputError, Result};
use super::market::PositionSpace;

/// Selection state for one market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "outcome", rename_all = "snake_case")]
pub enum MarketSelection {
    /// No outcome chosen.
    #[default]
    Unselected,
    /// Outcome chosen for trading; does not condition other markets.
    Fixed(usize),
    /// Outcome assumed to hold; conditions every other market.
    Conditioning(usize),
}

/// Wire shape used by the selection store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSelection {
    /// `-1` when nothing is selected.
    pub selected_outcome_index: i64,
    pub is_assumed: bool,
}

impl MarketSelection {
    /// All-unselected selections for `markets` markets.
    pub fn reset(markets: usize) -> Vec<Self> {
        vec![Self::Unselected; markets]
    }

    /// Converts the selection store's representation.
    ///
    /// # Errors
    /// `InvalidInputError` if the market is assumed without an outcome or
    /// the index is below `-1`.
    pub fn from_raw(raw: RawSelection) -> std::result::Result<Self, InvalidInputError> {
        match (raw.selected_outcome_index, raw.is_assumed) {
            (-1, false) => Ok(Self::Unselected),
            (-1, true) => Err(InvalidInputError::AssumedWithoutOutcome),
            (index, assumed) => {
                let index = usize::try_from(index)
                    .map_err(|_| InvalidInputError::InvalidSelectionIndex(index))?;
                Ok(if assumed {
                    Self::Conditioning(index)
                } else {
                    Self::Fixed(index)
                })
            }
        }
    }

    pub fn to_raw(self) -> RawSelection {
        match self {
            Self::Unselected => RawSelection {
                selected_outcome_index: -1,
                is_assumed: false,
            },
            Self::Fixed(index) => RawSelection {
                selected_outcome_index: index as i64,
                is_assumed: false,
            },
            Self::Conditioning(index) => RawSelection {
                selected_outcome_index: index as i64,
                is_assumed: true,
            },
        }
    }

    pub fn selected_outcome(self) -> Option<usize> {
        match self {
            Self::Unselected => None,
            Self::Fixed(index) | Self::Conditioning(index) => Some(index),
        }
    }

    /// The assumed outcome, if this market conditions the others.
    pub fn conditioning_outcome(self) -> Option<usize> {
        match self {
            Self::Conditioning(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_assumed(self) -> bool {
        matches!(self, Self::Conditioning(_))
    }
}

/// Converts a full selection array from the store.
pub fn from_raw_selections(raw: &[RawSelection]) -> Result<Vec<MarketSelection>> {
    raw.iter()
        .map(|r| MarketSelection::from_raw(*r).map_err(Into::into))
        .collect()
}

/// Checks selection count and outcome ranges against the position space.
pub fn validate_selections(space: &PositionSpace, selections: &[MarketSelection]) -> Result<()> {
    if selections.len() != space.market_count() {
        return Err(InvalidInputError::SelectionLengthMismatch {
            expected: space.market_count(),
            actual: selections.len(),
        }
        .into());
    }
    for (market, selection) in space.markets().iter().zip(selections) {
        if let Some(index) = selection.selected_outcome() {
            if index >= market.outcome_count() {
                return Err(InvalidInputError::OutcomeIndexOutOfRange {
                    market: market.index,
                    outcomes: market.outcome_count(),
                    index,
                }
                .into());
            }
        }
    }
    Ok(())
}

//! Recompute - Snapshot → Probability Report
//!
//! One pure function per refresh. The caller captures funding, balances,
//! selections and staged amounts atomically into a `Snapshot`; the
//! pipeline never mixes inputs from two snapshots and keeps no state
//! between calls.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::aggregator::{aggregate, MarketProbabilities};
use crate::domain::display::{probability_changes, ProbabilityChange};
use crate::domain::error::Result;
use crate::domain::lmsr::{LmsrState, MarketMakerStage};
use crate::domain::market::PositionSpace;
use crate::domain::math::MathContext;
use crate::domain::selection::MarketSelection;
use crate::domain::simulator::simulate_market_probabilities;

/// One atomically captured set of engine inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
  /// Monotonic sequence assigned by the source; newer wins.
  pub sequence: u64,
  /// When the chain state was read.
  pub captured_at: DateTime<Utc>,
  /// Market maker funding and position balances.
  pub state: LmsrState,
  /// Per-market selections; `None` means no conditioning.
  #[serde(default)]
  pub selections: Option<Vec<MarketSelection>>,
  /// Signed per-position amounts of a staged trade.
  #[serde(default)]
  pub staged_trade_amounts: Option<Vec<Decimal>>,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbabilityReport {
  pub sequence: u64,
  pub captured_at: DateTime<Utc>,
  pub stage: Option<MarketMakerStage>,
  pub market_probabilities: MarketProbabilities,
  /// Present only when staged amounts were supplied.
  pub market_probabilities_after_staged_trade: Option<MarketProbabilities>,
  /// Per-market movement caused by the staged trade.
  pub changes: Option<Vec<Option<Vec<ProbabilityChange>>>>,
}

/// Runs LMSR → aggregator, and simulator → aggregator when a trade is staged.
///
/// # Errors
/// Propagates the first engine error; no partial report is returned.
#[instrument(skip_all, fields(sequence = snapshot.sequence))]
pub fn recompute(
  space: &PositionSpace,
  ctx: &MathContext,
  significant_change_pct: Decimal,
  snapshot: &Snapshot,
) -> Result<ProbabilityReport> {
  let state = &snapshot.state;
  state.validate()?;
  state.check_against(space)?;

  let selections = snapshot.selections.as_deref();
  let position_weights = state.position_weights(ctx)?;
  let market_probabilities = aggregate(space, selections, &position_weights, ctx)?;

  let (after, changes) = match snapshot.staged_trade_amounts.as_deref() {
    Some(amounts) => {
      let inv_b = state.inverse_liquidity(ctx)?;
      let after = simulate_market_probabilities(
        space,
        selections,
        state,
        amounts,
        &inv_b,
        ctx,
      )?;
      let changes =
        probability_changes(&market_probabilities, &after, significant_change_pct, ctx)?;
      (Some(after), Some(changes))
    }
    None => (None, None),
  };

  debug!(
    positions = space.len(),
    markets = space.market_count(),
    staged = after.is_some(),
    "Probabilities recomputed"
  );

  Ok(ProbabilityReport {
    sequence: snapshot.sequence,
    captured_at: snapshot.captured_at,
    stage: state.stage(),
    market_probabilities,
    market_probabilities_after_staged_trade: after,
    changes,
  })
}

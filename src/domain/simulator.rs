//! Staged-trade simulator.
//!
//! Predicts position probabilities after a not-yet-submitted trade by
//! re-weighting each position with `exp(amount · invB)` and renormalizing.
//! Amounts are outcome-token deltas from the trader's side: positive buys
//! a position (raising its probability), negative sells it.
//!
//! Weights are built from the LMSR state's exponents rather than from
//! already-rounded probabilities: position `i` gets
//! `exp(invB · (amount[i] − balance[i]) − max_j invB · (amount[j] − balance[j]))`.
//! Every `exp` argument is `<= 0` and the largest weight is exactly one, so
//! a position whose raw probability rounds to zero can still be moved by a
//! staged trade. The shift is a common factor and cancels in the
//! normalization.

use rust_decimal::Decimal;

use super::aggregator::{aggregate, MarketProbabilities};
use super::error::{DomainError, InvalidInputError, Result};
use super::lmsr::{InverseLiquidity, LmsrState};
use super::market::PositionSpace;
use super::math::MathContext;
use super::selection::MarketSelection;

/// Returns the normalized position probabilities after `staged_amounts`.
///
/// # Errors
/// - `InvalidInputError::StagedLengthMismatch` if the amount count differs
///   from the position count
/// - `DomainError::ZeroNormalizer` if every weight is zero
pub fn simulate_positions(
    state: &LmsrState,
    staged_amounts: &[Decimal],
    inv_b: &InverseLiquidity,
    ctx: &MathContext,
) -> Result<Vec<Decimal>> {
    state.validate()?;
    let balances = state.position_balances();
    if staged_amounts.len() != balances.len() {
        return Err(InvalidInputError::StagedLengthMismatch {
            expected: balances.len(),
            actual: staged_amounts.len(),
        }
        .into());
    }

    let exponents = balances
        .iter()
        .zip(staged_amounts)
        .map(|(&balance, &amount)| inv_b.scale(ctx, ctx.sub(amount, balance)?))
        .collect::<Result<Vec<_>>>()?;
    let weights = ctx.exp_shifted(&exponents)?;

    let total = ctx.sum(weights.iter().copied())?;
    if total.is_zero() {
        return Err(DomainError::ZeroNormalizer.into());
    }
    let normalizer = ctx.div(Decimal::ONE, total)?;

    weights
        .into_iter()
        .map(|w| ctx.mul(w, normalizer))
        .collect()
}

/// Runs [`simulate_positions`] and aggregates the result per market.
///
/// # Errors
/// As [`simulate_positions`] and [`aggregate`]; additionally
/// `InvalidStateError::BalanceLengthMismatch` if the state does not match
/// the position space.
pub fn simulate_market_probabilities(
    space: &PositionSpace,
    selections: Option<&[MarketSelection]>,
    state: &LmsrState,
    staged_amounts: &[Decimal],
    inv_b: &InverseLiquidity,
    ctx: &MathContext,
) -> Result<MarketProbabilities> {
    state.check_against(space)?;
    let adjusted = simulate_positions(state, staged_amounts, inv_b, ctx)?;
    aggregate(space, selections, &adjusted, ctx)
}

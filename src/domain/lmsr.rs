//! Logarithmic Market Scoring Rule (LMSR) position probabilities.
//!
//! The market maker holds a balance of every position token. With
//! `N` positions and funding `F`, the liquidity-scaled inverse parameter
//! is `invB = ln(N) / F`, and each position's marginal price is
//! proportional to `exp(-invB · balance)`.
//! Reference: Hanson (2003) "Combinatorial Information Market Design"

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{DomainError, InvalidStateError, Result};
use super::market::PositionSpace;
use super::math::MathContext;

/// Lifecycle stage reported by the market maker contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketMakerStage {
    Running,
    Paused,
    Closed,
}

/// Immutable snapshot of the market maker's on-chain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LmsrState {
    funding: Decimal,
    position_balances: Vec<Decimal>,
    #[serde(default)]
    stage: Option<MarketMakerStage>,
    #[serde(default)]
    fee: Option<Decimal>,
}

impl LmsrState {
    /// Creates a snapshot, checking the scalar invariants.
    ///
    /// # Errors
    /// - `DomainError::NonPositiveFunding` if `funding <= 0`
    /// - `InvalidStateError::EmptyPositions` if `position_balances` is empty
    /// - `InvalidStateError::NegativeBalance` for any negative balance
    pub fn new(funding: Decimal, position_balances: Vec<Decimal>) -> Result<Self> {
        let state = Self {
            funding,
            position_balances,
            stage: None,
            fee: None,
        };
        state.validate()?;
        Ok(state)
    }

    /// Attaches the market maker's stage and fee (informational only).
    pub fn with_metadata(mut self, stage: MarketMakerStage, fee: Decimal) -> Self {
        self.stage = Some(stage);
        self.fee = Some(fee);
        self
    }

    /// Re-checks the invariants. Deserialized snapshots bypass `new`.
    pub fn validate(&self) -> Result<()> {
        if self.funding <= Decimal::ZERO {
            return Err(DomainError::NonPositiveFunding(self.funding).into());
        }
        if self.position_balances.is_empty() {
            return Err(InvalidStateError::EmptyPositions.into());
        }
        if let Some((index, value)) = self
            .position_balances
            .iter()
            .enumerate()
            .find(|(_, b)| b.is_sign_negative() && !b.is_zero())
        {
            return Err(InvalidStateError::NegativeBalance {
                index,
                value: *value,
            }
            .into());
        }
        Ok(())
    }

    /// Checks that there is exactly one balance per position.
    pub fn check_against(&self, space: &PositionSpace) -> Result<()> {
        if self.position_balances.len() != space.len() {
            return Err(InvalidStateError::BalanceLengthMismatch {
                expected: space.len(),
                actual: self.position_balances.len(),
            }
            .into());
        }
        Ok(())
    }

    pub fn funding(&self) -> Decimal {
        self.funding
    }

    pub fn position_balances(&self) -> &[Decimal] {
        &self.position_balances
    }

    pub fn stage(&self) -> Option<MarketMakerStage> {
        self.stage
    }

    pub fn fee(&self) -> Option<Decimal> {
        self.fee
    }

    /// Number of positions `N`.
    pub fn position_count(&self) -> usize {
        self.position_balances.len()
    }

    /// Computes `invB = ln(N) / funding`.
    pub fn inverse_liquidity(&self, ctx: &MathContext) -> Result<InverseLiquidity> {
        self.validate()?;
        InverseLiquidity::new(ctx, self.position_count(), self.funding)
    }

    /// Raw (unnormalized) position probabilities `exp(-invB · balance[i])`.
    ///
    /// For a funding-consistent state these already sum to one; after
    /// trading they generally do not, so consumers renormalize.
    ///
    /// Weights below the transcendental precision round to zero; use
    /// [`position_weights`](Self::position_weights) for aggregation.
    pub fn position_probabilities(&self, ctx: &MathContext) -> Result<Vec<Decimal>> {
        self.position_exponents(ctx)?
            .into_iter()
            .map(|exponent| ctx.exp(exponent))
            .collect()
    }

    /// Log-weights `-invB · balance[i]`.
    pub fn position_exponents(&self, ctx: &MathContext) -> Result<Vec<Decimal>> {
        let inv_b = self.inverse_liquidity(ctx)?;
        self.position_balances
            .iter()
            .map(|&balance| inv_b.scale(ctx, balance).map(|scaled| ctx.neg(scaled)))
            .collect()
    }

    /// Position weights proportional to the raw probabilities, scaled so
    /// the largest is exactly one.
    ///
    /// The aggregator renormalizes, so the common factor cancels; a state
    /// whose every balance is large still yields a usable distribution.
    pub fn position_weights(&self, ctx: &MathContext) -> Result<Vec<Decimal>> {
        ctx.exp_shifted(&self.position_exponents(ctx)?)
    }
}

/// The LMSR inverse liquidity parameter `invB = ln(N) / funding`.
///
/// `ln(N)` and the funding are kept apart so that `scale` can divide
/// first: for wei-scaled amounts `amount / funding` is O(1) and keeps all
/// significant digits, whereas `ln(N) / funding` alone would not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InverseLiquidity {
    ln_n: Decimal,
    funding: Decimal,
}

impl InverseLiquidity {
    /// # Errors
    /// `DomainError::NonPositiveFunding` if `funding <= 0`;
    /// `InvalidStateError::EmptyPositions` if `positions == 0`.
    pub fn new(ctx: &MathContext, positions: usize, funding: Decimal) -> Result<Self> {
        if funding <= Decimal::ZERO {
            return Err(DomainError::NonPositiveFunding(funding).into());
        }
        if positions == 0 {
            return Err(InvalidStateError::EmptyPositions.into());
        }
        Ok(Self {
            ln_n: ctx.ln(Decimal::from(positions))?,
            funding,
        })
    }

    /// `amount · invB`.
    pub fn scale(&self, ctx: &MathContext, amount: Decimal) -> Result<Decimal> {
        ctx.mul(self.ln_n, ctx.div(amount, self.funding)?)
    }

    /// The numeric value of `invB`.
    pub fn value(&self, ctx: &MathContext) -> Result<Decimal> {
        ctx.div(self.ln_n, self.funding)
    }

    pub fn ln_n(&self) -> Decimal {
        self.ln_n
    }
}

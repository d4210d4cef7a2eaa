//! Engine error taxonomy.
//!
//! Every error is fatal to the call that raised it: the engine never
//! retries and never substitutes a default. Callers decide whether to
//! show a stale value, a spinner, or an error state.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias used throughout the domain layer.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Mathematically undefined input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("funding must be strictly positive, got {0}")]
    NonPositiveFunding(Decimal),
    #[error("division by zero")]
    DivisionByZero,
    #[error("logarithm argument must be strictly positive, got {0}")]
    NonPositiveLogarithm(Decimal),
    #[error("probability weights sum to zero, cannot normalize")]
    ZeroNormalizer,
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}

/// Structural mismatch between the position space and a state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidStateError {
    #[error("position set is empty")]
    EmptyPositions,
    #[error("market {market} has no outcomes")]
    MarketWithoutOutcomes { market: String },
    #[error("duplicate market key {0}")]
    DuplicateMarketKey(String),
    #[error("expected {expected} position balances, got {actual}")]
    BalanceLengthMismatch { expected: usize, actual: usize },
    #[error("expected {expected} position probabilities, got {actual}")]
    ProbabilityLengthMismatch { expected: usize, actual: usize },
    #[error("position balance at index {index} is negative: {value}")]
    NegativeBalance { index: usize, value: Decimal },
    #[error("market {market} reports {reported} outcome slots, catalog has {expected}")]
    OutcomeSlotMismatch {
        market: String,
        expected: usize,
        reported: usize,
    },
    #[error("expected {expected} market slot counts, got {actual}")]
    SlotCountLengthMismatch { expected: usize, actual: usize },
    #[error("atomic outcome slot count {reported} does not match computed {expected}")]
    AtomicSlotMismatch { expected: usize, reported: usize },
    #[error("scalar bounds invalid: lower {lower} must be below upper {upper}")]
    InvalidBounds { lower: Decimal, upper: Decimal },
}

/// Malformed caller-supplied vectors or selections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    #[error("expected {expected} staged trade amounts, got {actual}")]
    StagedLengthMismatch { expected: usize, actual: usize },
    #[error("expected {expected} market selections, got {actual}")]
    SelectionLengthMismatch { expected: usize, actual: usize },
    #[error("market {market} has {outcomes} outcomes, selection index {index} is out of range")]
    OutcomeIndexOutOfRange {
        market: usize,
        outcomes: usize,
        index: usize,
    },
    #[error("selection index {0} is invalid, expected -1 or a non-negative index")]
    InvalidSelectionIndex(i64),
    #[error("market flagged as assumed without a selected outcome")]
    AssumedWithoutOutcome,
    #[error("position probability at index {index} is negative: {value}")]
    NegativeProbability { index: usize, value: Decimal },
    #[error("market {0} is not a scalar market")]
    NotScalar(String),
    #[error("value {value} lies outside scalar bounds [{lower}, {upper}]")]
    ValueOutOfBounds {
        value: Decimal,
        lower: Decimal,
        upper: Decimal,
    },
    #[error("market index {0} is out of range")]
    MarketIndexOutOfRange(usize),
}

/// Top-level engine error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("invalid state: {0}")]
    InvalidState(#[from] InvalidStateError),
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl EngineError {
    /// Returns true for mathematically undefined input.
    pub const fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }

    /// Returns true for structural state mismatches.
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }

    /// Returns true for malformed caller input.
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

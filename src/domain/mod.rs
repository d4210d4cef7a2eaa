//! Domain layer - LMSR probability engine.
//!
//! Pure, synchronous inner ring of the hexagonal architecture: no I/O,
//! no async, no shared mutable state. Every function takes its inputs
//! explicitly and returns a fresh result.
//!
//! Data flows one way:
//! balances → `lmsr` → `aggregator` → (`simulator` → `aggregator`) → `display`

pub mod aggregator;
pub mod display;
pub mod error;
pub mod lmsr;
pub mod market;
pub mod math;
pub mod selection;
pub mod simulator;

// Re-export core types for convenience
pub use aggregator::{aggregate, MarketProbabilities, MarketProbability};
pub use error::{DomainError, EngineError, InvalidInputError, InvalidStateError};
pub use lmsr::{InverseLiquidity, LmsrState, MarketMakerStage};
pub use market::{Market, MarketDefinition, Outcome, OutcomeDefinition, Position, PositionSpace, ScalarBounds};
pub use math::MathContext;
pub use selection::{MarketSelection, RawSelection};
pub use simulator::{simulate_market_probabilities, simulate_positions};

//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `SnapshotSource`: Funding, balances, selections and staged trade

pub mod snapshot_source;

pub use snapshot_source::SnapshotSource;

//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces.
//!
//! Use cases:
//! - `recompute`: Snapshot → probability report (pure)
//! - `SnapshotPoller`: Periodic fetch + recompute + publish

pub mod poller;
pub mod recompute;

pub use poller::{ReportReceiver, SnapshotPoller};
pub use recompute::{recompute, ProbabilityReport, Snapshot};

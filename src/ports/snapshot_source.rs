//! Snapshot Source Port - Chain State Collaborator Interface
//!
//! Defines the trait the poller uses to obtain engine inputs. An adapter
//! reads funding and position balances from the market maker contract,
//! pairs them with the current selections and staged trade, and returns
//! them as one atomically captured `Snapshot`.
//!
//! The engine ships no adapter: wallet and network transport live
//! outside this crate.

use async_trait::async_trait;

use crate::usecases::recompute::Snapshot;

/// Trait for snapshot providers.
///
/// Implementors must assign strictly increasing `sequence` numbers to
/// successive snapshots so consumers can discard stale results.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
  /// Capture the current engine inputs.
  ///
  /// # Errors
  /// Returns error if the chain state cannot be read.
  async fn fetch_snapshot(&self) -> anyhow::Result<Snapshot>;
}

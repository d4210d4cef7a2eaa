//! Snapshot Poller - Periodic Recompute Loop
//!
//! Fetches a snapshot from the `SnapshotSource` on a fixed interval,
//! runs the pure `recompute` pipeline, and publishes the report on a
//! `tokio::sync::watch` channel.
//!
//! Last-write-wins: a report whose sequence is not newer than the one
//! already published is dropped. Failed fetches or recomputes are
//! logged and the previous report stays published.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use rust_decimal::Decimal;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::config::AppConfig;
use crate::domain::market::PositionSpace;
use crate::domain::math::MathContext;
use crate::ports::snapshot_source::SnapshotSource;

use super::recompute::{recompute, ProbabilityReport};

/// Latest published report, `None` until the first success.
pub type ReportReceiver = watch::Receiver<Option<Arc<ProbabilityReport>>>;

/// Drives the engine from a polled snapshot source.
pub struct SnapshotPoller<S: SnapshotSource> {
  /// Chain state collaborator.
  source: Arc<S>,
  /// Position space shared with consumers.
  space: Arc<PositionSpace>,
  /// Precision for every pipeline run.
  ctx: MathContext,
  /// Highlight threshold for staged changes.
  significant_change_pct: Decimal,
  /// Fetch cadence.
  interval: Duration,
  /// Publication channel.
  report_tx: watch::Sender<Option<Arc<ProbabilityReport>>>,
  /// Sequence of the last published report.
  last_sequence: Option<u64>,
}

impl<S: SnapshotSource> SnapshotPoller<S> {
  /// Create a poller and the receiver consumers watch for reports.
  ///
  /// # Errors
  /// Returns error if `polling.interval_ms` is zero.
  pub fn new(
    source: Arc<S>,
    space: Arc<PositionSpace>,
    config: &AppConfig,
  ) -> Result<(Self, ReportReceiver)> {
    ensure!(
      config.polling.interval_ms > 0,
      "polling interval_ms must be positive"
    );
    let (report_tx, report_rx) = watch::channel(None);

    let poller = Self {
      source,
      space,
      ctx: config.engine.math_context(),
      significant_change_pct: config.engine.significant_change_pct,
      interval: Duration::from_millis(config.polling.interval_ms),
      report_tx,
      last_sequence: None,
    };

    Ok((poller, report_rx))
  }

  /// Run the polling loop until a shutdown signal arrives.
  #[instrument(skip(self, shutdown_rx), name = "snapshot_poller")]
  pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
    info!(
      interval_ms = self.interval.as_millis() as u64,
      positions = self.space.len(),
      "Snapshot poller started"
    );

    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Snapshot poller shutting down");
          return Ok(());
        }
        _ = ticker.tick() => {
          if let Err(e) = self.poll_once().await {
            warn!(error = %e, "Snapshot refresh failed, keeping previous report");
          }
        }
      }
    }
  }

  /// Fetch, recompute and publish once.
  ///
  /// Returns `true` if a new report was published, `false` if the
  /// snapshot was stale.
  ///
  /// # Errors
  /// Returns error if the fetch or the recompute fails.
  pub async fn poll_once(&mut self) -> Result<bool> {
    let snapshot = self
      .source
      .fetch_snapshot()
      .await
      .context("Failed to fetch snapshot")?;

    if self.last_sequence.is_some_and(|last| snapshot.sequence <= last) {
      debug!(
        sequence = snapshot.sequence,
        last = ?self.last_sequence,
        "Stale snapshot discarded"
      );
      return Ok(false);
    }

    let report = recompute(&self.space, &self.ctx, self.significant_change_pct, &snapshot)
      .with_context(|| format!("Failed to recompute snapshot {}", snapshot.sequence))?;

    self.last_sequence = Some(report.sequence);
    self.report_tx.send_replace(Some(Arc::new(report)));

    debug!(sequence = snapshot.sequence, "Report published");
    Ok(true)
  }

  /// Sequence of the last published report.
  pub fn last_sequence(&self) -> Option<u64> {
    self.last_sequence
  }
}

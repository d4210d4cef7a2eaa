//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `engine.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;
use crate::domain::math::MAX_TRANSCENDENTAL_PLACES;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    markets = config.markets.len(),
    transcendental_places = config.engine.transcendental_places,
    interval_ms = config.polling.interval_ms,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
///
/// # Errors
/// Returns error if parsing or validation fails.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse engine configuration")?;

  validate_config(&config)?;

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Precision within what `Decimal` can represent
/// - A non-empty catalog with unique keys and outcome codes
/// - Both-or-neither scalar bounds, with lower < upper
fn validate_config(config: &AppConfig) -> Result<()> {
  // Engine validation
  anyhow::ensure!(
    (1..=MAX_TRANSCENDENTAL_PLACES).contains(&config.engine.transcendental_places),
    "transcendental_places must be in [1, {}], got {}",
    MAX_TRANSCENDENTAL_PLACES,
    config.engine.transcendental_places
  );
  anyhow::ensure!(
    config.engine.display_places <= 10,
    "display_places must be at most 10, got {}",
    config.engine.display_places
  );
  anyhow::ensure!(
    config.engine.significant_change_pct >= Decimal::ZERO,
    "significant_change_pct must be non-negative, got {}",
    config.engine.significant_change_pct
  );

  // Polling validation
  anyhow::ensure!(
    config.polling.interval_ms > 0,
    "polling interval_ms must be positive"
  );

  // Market validation
  anyhow::ensure!(
    !config.markets.is_empty(),
    "At least one market must be configured"
  );

  let mut keys = HashSet::new();
  for (i, market) in config.markets.iter().enumerate() {
    anyhow::ensure!(!market.key.is_empty(), "Market {} has empty key", i);
    anyhow::ensure!(
      keys.insert(market.key.as_str()),
      "Market {} ({}) duplicates an earlier key",
      i,
      market.key
    );
    anyhow::ensure!(
      !market.outcomes.is_empty(),
      "Market {} ({}) has no outcomes",
      i,
      market.key
    );

    let mut shorts = HashSet::new();
    for outcome in &market.outcomes {
      anyhow::ensure!(
        shorts.insert(outcome.short.as_str()),
        "Market {} ({}) repeats outcome code {}",
        i,
        market.key,
        outcome.short
      );
    }

    match (market.lower_bound, market.upper_bound) {
      (Some(lower), Some(upper)) => anyhow::ensure!(
        lower < upper,
        "Market {} ({}) lower_bound {} must be below upper_bound {}",
        i,
        market.key,
        lower,
        upper
      ),
      (None, None) => {}
      _ => anyhow::bail!(
        "Market {} ({}) must set both lower_bound and upper_bound or neither",
        i,
        market.key
      ),
    }
  }

  Ok(())
}

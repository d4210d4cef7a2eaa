//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `engine.toml`: numeric
//! precision, polling cadence, logging, and the market catalog the
//! position space is generated from. Nothing market-specific is
//! hardcoded in the domain layer.

pub mod loader;
pub mod telemetry;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::display::DEFAULT_SIGNIFICANT_CHANGE_PCT;
use crate::domain::error::EngineError;
use crate::domain::market::{MarketDefinition, OutcomeDefinition, PositionSpace, ScalarBounds};
use crate::domain::math::{MathContext, DEFAULT_TRANSCENDENTAL_PLACES, PROBABILITY_DECIMAL_PLACES};

pub use loader::{load_config, parse_config};
pub use telemetry::init_tracing;

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Numeric precision and display settings.
  #[serde(default)]
  pub engine: EngineConfig,
  /// Snapshot polling cadence.
  #[serde(default)]
  pub polling: PollingConfig,
  /// Structured logging.
  #[serde(default)]
  pub logging: LoggingConfig,
  /// Market catalog, in market index order.
  pub markets: Vec<MarketConfig>,
}

impl AppConfig {
  /// Builds the position space from the market catalog.
  ///
  /// # Errors
  /// Returns `InvalidStateError` for an unusable catalog.
  pub fn position_space(&self) -> Result<PositionSpace, EngineError> {
    PositionSpace::new(self.markets.iter().map(MarketConfig::to_definition).collect())
  }
}

/// Numeric precision configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Fractional digits kept by `ln` and `exp` (1..=28).
  #[serde(default = "default_transcendental_places")]
  pub transcendental_places: u32,
  /// Fractional digits for displayed probabilities.
  #[serde(default = "default_display_places")]
  pub display_places: u32,
  /// Percentage-point change above which a staged move is highlighted.
  #[serde(default = "default_significant_change_pct")]
  pub significant_change_pct: Decimal,
}

impl EngineConfig {
  pub fn math_context(&self) -> MathContext {
    MathContext::new(self.transcendental_places, self.display_places)
  }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      transcendental_places: default_transcendental_places(),
      display_places: default_display_places(),
      significant_change_pct: default_significant_change_pct(),
    }
  }
}

/// Polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
  /// Interval between snapshot fetches (milliseconds).
  #[serde(default = "default_interval_ms")]
  pub interval_ms: u64,
}

impl Default for PollingConfig {
  fn default() -> Self {
    Self {
      interval_ms: default_interval_ms(),
    }
  }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
  /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Emit JSON lines instead of human-readable output.
  #[serde(default)]
  pub json: bool,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      json: false,
    }
  }
}

/// One market of the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
  /// Unique market key.
  pub key: String,
  /// Human-readable question.
  pub title: String,
  /// Outcomes in slot order.
  pub outcomes: Vec<OutcomeConfig>,
  /// Lower bound of a scalar market.
  pub lower_bound: Option<Decimal>,
  /// Upper bound of a scalar market.
  pub upper_bound: Option<Decimal>,
  /// Unit of a scalar market's value.
  pub unit: Option<String>,
}

impl MarketConfig {
  /// Converts to the domain catalog entry.
  pub fn to_definition(&self) -> MarketDefinition {
    let bounds = match (self.lower_bound, self.upper_bound) {
      (Some(lower), Some(upper)) => Some(ScalarBounds {
        lower,
        upper,
        unit: self.unit.clone(),
      }),
      _ => None,
    };
    MarketDefinition {
      key: self.key.clone(),
      title: self.title.clone(),
      outcomes: self
        .outcomes
        .iter()
        .map(|o| OutcomeDefinition {
          title: o.title.clone(),
          short: o.short.clone(),
        })
        .collect(),
      bounds,
    }
  }
}

/// One outcome of a market.
#[derive(Debug, Clone, Deserialize)]
pub struct OutcomeConfig {
  /// Display title.
  pub title: String,
  /// Short code, unique within the market.
  pub short: String,
}

// Default value functions for serde

fn default_transcendental_places() -> u32 {
  DEFAULT_TRANSCENDENTAL_PLACES
}

fn default_display_places() -> u32 {
  PROBABILITY_DECIMAL_PLACES
}

fn default_significant_change_pct() -> Decimal {
  DEFAULT_SIGNIFICANT_CHANGE_PCT
}

fn default_interval_ms() -> u64 {
  5_000
}

fn default_log_level() -> String {
  "info".to_string()
}

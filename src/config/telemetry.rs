//! Tracing initialization.
//!
//! Installs a `tracing-subscriber` fmt subscriber. `RUST_LOG` overrides
//! the configured level. Safe to call more than once: later calls leave
//! the first subscriber in place.

use anyhow::Result;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::LoggingConfig;

/// Install the global subscriber described by `config`.
///
/// # Errors
/// Returns error if the configured level is not a valid filter directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
  let filter = match EnvFilter::try_from_default_env() {
    Ok(filter) => filter,
    Err(_) => EnvFilter::try_new(&config.level)
      .map_err(|e| anyhow::anyhow!("Invalid log level {:?}: {e}", config.level))?,
  };

  let builder = tracing_subscriber::fmt().with_env_filter(filter);
  let installed = if config.json {
    builder.json().try_init()
  } else {
    builder.try_init()
  };
  if let Err(e) = installed {
    debug!(error = %e, "Tracing subscriber already installed, keeping it");
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_init_is_idempotent() {
    let config = LoggingConfig::default();
    assert!(init_tracing(&config).is_ok());
    assert!(init_tracing(&config).is_ok());
  }

  #[test]
  fn test_second_init_with_other_format_keeps_first() {
    let plain = LoggingConfig::default();
    let json = LoggingConfig {
      json: true,
      ..LoggingConfig::default()
    };
    assert!(init_tracing(&plain).is_ok());
    assert!(init_tracing(&json).is_ok());
  }

  #[test]
  fn test_invalid_level_is_rejected() {
    let config = LoggingConfig {
      level: "lmsr=bogus".to_string(),
      ..LoggingConfig::default()
    };
    if std::env::var("RUST_LOG").is_err() {
      assert!(init_tracing(&config).is_err());
    }
  }
}

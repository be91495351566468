//! tracing subscriber setup.
//!
//! `[general]` picks the level and the output format (`json` lines or
//! `pretty`). `RUST_LOG`, when set, replaces the level.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use sluice_core::config::GeneralConfig;

/// Filter directive used when `RUST_LOG` is not set.
///
/// `verbose` forces `debug` regardless of `log_level`.
pub fn default_directive(config: &GeneralConfig) -> &str {
    if config.verbose {
        "debug"
    } else {
        &config.log_level
    }
}

/// Install the global subscriber. Fails if one is already set or the
/// format is neither `json` nor `pretty`.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let fmt_layer = match config.log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        "pretty" => tracing_subscriber::fmt::layer().pretty().boxed(),
        other => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                other
            ));
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| {
            anyhow::anyhow!(
                "failed to initialize {} tracing subscriber: {}",
                config.log_format,
                e
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_used_when_not_verbose() {
        let config = GeneralConfig {
            log_level: "warn".to_owned(),
            ..Default::default()
        };
        assert_eq!(default_directive(&config), "warn");
    }

    #[test]
    fn verbose_forces_debug() {
        let config = GeneralConfig {
            log_level: "error".to_owned(),
            verbose: true,
            ..Default::default()
        };
        assert_eq!(default_directive(&config), "debug");
    }

    #[test]
    fn unknown_format_is_rejected() {
        let config = GeneralConfig {
            log_format: "xml".to_owned(),
            ..Default::default()
        };
        let err = init_tracing(&config).unwrap_err();
        assert!(err.to_string().contains("unknown log format"));
    }
}

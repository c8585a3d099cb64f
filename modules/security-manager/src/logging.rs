//! Optional global `tracing` subscriber for hosts without their own.

use serde::Deserialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info,authn=debug`.
    pub level: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
            with_target: true,
        }
    }
}

/// Install a global subscriber built from `cfg`.
///
/// Returns `false` when the process already has one; the existing subscriber
/// is left in place.
///
/// # Errors
///
/// `LogFilter` when `cfg.level` is not a valid filter directive.
pub fn init_logging(cfg: &LoggingConfig) -> Result<bool, ConfigError> {
    let filter = EnvFilter::try_new(&cfg.level).map_err(|e| ConfigError::LogFilter {
        directive: cfg.level.clone(),
        reason: e.to_string(),
    })?;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match cfg.format {
        LogFormat::Text => fmt::layer().with_target(cfg.with_target).boxed(),
        LogFormat::Json => fmt::layer().json().with_target(cfg.with_target).boxed(),
    };

    Ok(tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .is_ok())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn bad_directive_is_rejected() {
        let cfg = LoggingConfig {
            level: "authn=loud".to_owned(),
            ..LoggingConfig::default()
        };
        let err = init_logging(&cfg).unwrap_err();
        assert_eq!(err.kind(), "log_filter");
        assert!(err.to_string().contains("authn=loud"));
    }

    #[test]
    fn second_install_is_a_no_op() {
        let cfg = LoggingConfig {
            format: LogFormat::Json,
            ..LoggingConfig::default()
        };
        assert!(init_logging(&cfg).is_ok());
        assert!(!init_logging(&cfg).unwrap());
    }

    #[test]
    fn format_from_yaml_names() {
        let cfg: LoggingConfig =
            serde_json::from_value(serde_json::json!({ "level": "debug", "format": "json" }))
                .unwrap();
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(cfg.with_target);
    }
}

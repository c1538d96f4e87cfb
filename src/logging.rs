//! Structured logging setup.
//!
//! Installs one global `tracing` subscriber writing to stderr. `RUST_LOG`
//! overrides the configured level. Coordinator failures are logged with
//! `event`, `tab_id`, `step` and `error` fields; the locator, classifier and
//! painter log their decisions at `debug`.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as fmt_layer, EnvFilter};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Line layout for log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Compact => f.write_str("compact"),
        }
    }
}

/// `[logging]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `dimmer::coordinator=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug)]
pub enum LogError {
    AlreadyInitialized,
    InvalidLevel(String),
    SetSubscriber(tracing::subscriber::SetGlobalDefaultError),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "logging already initialized"),
            Self::InvalidLevel(level) => write!(f, "invalid log level: {level}"),
            Self::SetSubscriber(e) => write!(f, "failed to set global subscriber: {e}"),
        }
    }
}

impl std::error::Error for LogError {}

impl From<tracing::subscriber::SetGlobalDefaultError> for LogError {
    fn from(e: tracing::subscriber::SetGlobalDefaultError) -> Self {
        Self::SetSubscriber(e)
    }
}

/// Build the filter: `RUST_LOG` when set and valid, else the configured level.
pub fn build_filter(level: &str) -> Result<EnvFilter, LogError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|_| LogError::InvalidLevel(level.to_string()))
}

/// Install the global subscriber. A second call returns
/// [`LogError::AlreadyInitialized`].
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    let filter = build_filter(&config.level)?;

    match config.format {
        LogFormat::Pretty => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt_layer::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(true),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt_layer::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(false),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let _ = LOGGING_INITIALIZED.set(());
    tracing::debug!(level = %config.level, format = %config.format, "logging initialized");
    Ok(())
}

//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

use super::defaults::{ENV_LOG_LEVEL, ENV_STYLESHEET};
use super::sources::{config_root_dir, read_config_text_with_sources, ConfigSource};
use super::Config;

/// Resolved configuration plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from `--config`).
pub fn load_config(path_override: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

pub(super) fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&Path>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (text, source) = read_config_text_with_sources(path_override, &read_file, &config_root)?;
    let mut config: Config = toml::from_str(&text)?;
    apply_env_overrides(&mut config, &env_lookup);
    normalize(&mut config);
    validate(&config)?;
    debug!(%source, "configuration loaded");
    Ok(LoadedConfig { config, source })
}

fn non_empty_env<FEnv>(env_lookup: &FEnv, name: &str) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn apply_env_overrides<FEnv>(config: &mut Config, env_lookup: &FEnv)
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(level) = non_empty_env(env_lookup, ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(path) = non_empty_env(env_lookup, ENV_STYLESHEET) {
        config.coordinator.stylesheet_path = path;
    }
}

fn normalize(config: &mut Config) {
    for scheme in &mut config.coordinator.reload_schemes {
        *scheme = scheme.trim().trim_end_matches(':').to_ascii_lowercase();
    }
}

/// Reject values no component can work with.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let alpha = config.classifier.alpha_threshold;
    if !(0.0..=1.0).contains(&alpha) {
        return Err(ConfigError::Invalid(format!(
            "classifier.alpha_threshold must be within [0, 1], got {alpha}"
        )));
    }
    if config.coordinator.stylesheet_path.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "coordinator.stylesheet_path must not be empty".to_string(),
        ));
    }
    if config.coordinator.reload_schemes.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::Invalid(
            "coordinator.reload_schemes must not contain empty entries".to_string(),
        ));
    }
    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "logging.level must not be empty".to_string(),
        ));
    }
    Ok(())
}

//! Config-file source discovery.
//!
//! Source order: explicit path > local file > global file > built-in
//! defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Config loaded from explicit `--config` path.
    Explicit(PathBuf),
    /// Config loaded from `./dimmer.toml`.
    Local,
    /// Config loaded from `<config root>/dimmer/dimmer.toml`.
    Global(PathBuf),
    /// No file found; defaults were used.
    BuiltInDefaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) | Self::Global(path) => write!(f, "{}", path.display()),
            Self::Local => f.write_str(CONFIG_FILE_NAME),
            Self::BuiltInDefaults => f.write_str("built-in defaults"),
        }
    }
}

/// Read config text from the highest-precedence available source.
///
/// A missing explicit path is an error; missing implicit files fall through.
pub(super) fn read_config_text_with_sources<FRead, FRoot>(
    path_override: Option<&Path>,
    read_file: &FRead,
    config_root: &FRoot,
) -> Result<(String, ConfigSource), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    if let Some(path) = path_override {
        let text = read_file(path)?;
        return Ok((text, ConfigSource::Explicit(path.to_path_buf())));
    }

    if let Ok(text) = read_file(Path::new(CONFIG_FILE_NAME)) {
        return Ok((text, ConfigSource::Local));
    }
    if let Some(dir) = config_root() {
        let global = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if let Ok(text) = read_file(&global) {
            return Ok((text, ConfigSource::Global(global)));
        }
    }

    Ok((String::new(), ConfigSource::BuiltInDefaults))
}

/// `$XDG_CONFIG_HOME`, falling back to `~/.config` and the platform config dir.
pub fn config_root_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}

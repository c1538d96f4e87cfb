//! Configuration loading from TOML files and environment variables.
//!
//! Precedence (highest wins):
//! 1. Environment variables (`DIMMER_LOG_LEVEL`, `DIMMER_STYLESHEET`)
//! 2. TOML file given via `--config`
//! 3. `./dimmer.toml`
//! 4. `$XDG_CONFIG_HOME/dimmer/dimmer.toml` (or `~/.config/dimmer/dimmer.toml`)
//! 5. Built-in defaults

mod defaults;
mod loader;
mod sources;
mod types;

pub use loader::{load_config, validate, LoadedConfig};
pub use sources::{config_root_dir, ConfigSource};
pub use types::{ClassifierConfig, Config, CoordinatorConfig};

//! Default configuration constants.

/// File name looked up in the working directory and the config root.
pub(super) const CONFIG_FILE_NAME: &str = "dimmer.toml";
/// Subdirectory of the config root holding the global config file.
pub(super) const CONFIG_DIR_NAME: &str = "dimmer";

/// Extension-relative path of the stylesheet asset.
pub(super) const DEFAULT_STYLESHEET_PATH: &str = "/src/rules.css";
/// URL schemes whose pages may be reloaded.
pub(super) const DEFAULT_RELOAD_SCHEMES: [&str; 2] = ["http", "https"];

/// Environment variable overriding `[logging] level`.
pub(super) const ENV_LOG_LEVEL: &str = "DIMMER_LOG_LEVEL";
/// Environment variable overriding `[coordinator] stylesheet_path`.
pub(super) const ENV_STYLESHEET: &str = "DIMMER_STYLESHEET";

//! Configuration data model.
//!
//! Every section is optional in the file; missing keys take the defaults
//! below.

use serde::{Deserialize, Serialize};

use super::defaults::{DEFAULT_RELOAD_SCHEMES, DEFAULT_STYLESHEET_PATH};
use crate::classifier::{Thresholds, DEFAULT_ALPHA_THRESHOLD, DEFAULT_RGB_THRESHOLD};
use crate::color::Threshold;
use crate::logging::LogConfig;
use crate::recolor::Palette;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub classifier: ClassifierConfig,
    /// Palette and colorfulness exceptions of the manual painter.
    pub recolor: Palette,
    pub coordinator: CoordinatorConfig,
    pub logging: LogConfig,
}

/// `[classifier]` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Per-channel inclusive upper bound of a dark color.
    pub rgb_threshold: Threshold,
    /// Alpha at or below which a background counts as transparent.
    pub alpha_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rgb_threshold: DEFAULT_RGB_THRESHOLD,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
        }
    }
}

impl ClassifierConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            rgb: self.rgb_threshold,
            alpha: self.alpha_threshold,
        }
    }
}

/// `[coordinator]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Stylesheet asset handed to insert/remove calls.
    pub stylesheet_path: String,
    pub bypass_cache: bool,
    /// Lowercase URL schemes of pages that may be reloaded.
    pub reload_schemes: Vec<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            stylesheet_path: DEFAULT_STYLESHEET_PATH.to_string(),
            bypass_cache: true,
            reload_schemes: DEFAULT_RELOAD_SCHEMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

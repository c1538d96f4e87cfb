//! Event scripts for offline replay.
//!
//! Accepts either a bare JSON array of events or an object that also sets
//! the URL the host reports for the active tab:
//!
//! ```json
//! { "active_url": "https://example.com/", "events": [{ "event": "installed" }] }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::state::TabEvent;
use crate::error::SnapshotError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub active_url: Option<String>,
    pub events: Vec<TabEvent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptForm {
    Bare(Vec<TabEvent>),
    Full(ReplayScript),
}

impl ReplayScript {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::from_str(text)? {
            ScriptForm::Bare(events) => Self {
                active_url: None,
                events,
            },
            ScriptForm::Full(script) => script,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }
}

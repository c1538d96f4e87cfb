//! Browser capability seam.
//!
//! Every capability is async and independently fallible. [`RecordingHost`]
//! is the dry-run implementation behind the `replay` command; it records
//! each call and can be told to reject selected actions.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use super::state::{Mode, TabId};
use crate::error::HostError;

/// Icon sizes shipped for each mode.
pub const ICON_SIZES: [u32; 5] = [48, 64, 128, 256, 512];

/// Toolbar icon set and title for one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeBadge {
    pub icons: BTreeMap<u32, String>,
    pub title: String,
}

impl ModeBadge {
    pub fn for_mode(mode: Mode) -> Self {
        let icons = ICON_SIZES
            .iter()
            .map(|size| (*size, format!("/icons/{mode}_{size}.png")))
            .collect();
        let title = match mode {
            Mode::Dark => "In dark mode",
            Mode::Light => "In light mode",
        };
        Self {
            icons,
            title: title.to_string(),
        }
    }
}

#[async_trait]
pub trait TabHost: Send + Sync {
    async fn reload(&self, tab_id: TabId, bypass_cache: bool) -> Result<(), HostError>;
    async fn insert_css(&self, tab_id: TabId, path: &str) -> Result<(), HostError>;
    async fn remove_css(&self, tab_id: TabId, path: &str) -> Result<(), HostError>;
    async fn set_icon(&self, icons: &BTreeMap<u32, String>) -> Result<(), HostError>;
    async fn set_title(&self, title: &str) -> Result<(), HostError>;
    /// URL of the active tab in the current window, if the host exposes one.
    async fn active_tab_url(&self) -> Result<Option<String>, HostError>;
}

/// One capability call observed by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostAction {
    Reload { tab_id: TabId, bypass_cache: bool },
    InsertCss { tab_id: TabId, path: String },
    RemoveCss { tab_id: TabId, path: String },
    SetIcon { icons: BTreeMap<u32, String> },
    SetTitle { title: String },
}

impl HostAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reload { .. } => "reload",
            Self::InsertCss { .. } => "insert_css",
            Self::RemoveCss { .. } => "remove_css",
            Self::SetIcon { .. } => "set_icon",
            Self::SetTitle { .. } => "set_title",
        }
    }
}

/// Host that records calls instead of touching a browser.
///
/// Only successful calls are recorded.
#[derive(Debug, Default)]
pub struct RecordingHost {
    active_url: Mutex<Option<String>>,
    rejected: Mutex<BTreeSet<&'static str>>,
    actions: Mutex<Vec<HostAction>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose active tab shows `url`.
    pub fn with_active_url(url: impl Into<String>) -> Self {
        let host = Self::default();
        host.set_active_url(Some(url.into()));
        host
    }

    pub fn set_active_url(&self, url: Option<String>) {
        *lock(&self.active_url) = url;
    }

    /// Make every future call of `action` (a [`HostAction::name`]) fail.
    pub fn reject(&self, action: &'static str) {
        lock(&self.rejected).insert(action);
    }

    pub fn actions(&self) -> Vec<HostAction> {
        lock(&self.actions).clone()
    }

    fn record(&self, action: HostAction) -> Result<(), HostError> {
        if lock(&self.rejected).contains(action.name()) {
            return Err(HostError::Rejected {
                action: action.name().to_string(),
                reason: "rejected by host".to_string(),
            });
        }
        lock(&self.actions).push(action);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TabHost for RecordingHost {
    async fn reload(&self, tab_id: TabId, bypass_cache: bool) -> Result<(), HostError> {
        self.record(HostAction::Reload {
            tab_id,
            bypass_cache,
        })
    }

    async fn insert_css(&self, tab_id: TabId, path: &str) -> Result<(), HostError> {
        self.record(HostAction::InsertCss {
            tab_id,
            path: path.to_string(),
        })
    }

    async fn remove_css(&self, tab_id: TabId, path: &str) -> Result<(), HostError> {
        self.record(HostAction::RemoveCss {
            tab_id,
            path: path.to_string(),
        })
    }

    async fn set_icon(&self, icons: &BTreeMap<u32, String>) -> Result<(), HostError> {
        self.record(HostAction::SetIcon {
            icons: icons.clone(),
        })
    }

    async fn set_title(&self, title: &str) -> Result<(), HostError> {
        self.record(HostAction::SetTitle {
            title: title.to_string(),
        })
    }

    async fn active_tab_url(&self) -> Result<Option<String>, HostError> {
        Ok(lock(&self.active_url).clone())
    }
}

//! Coordinator state, inbound events and outbound commands.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Global user preference for light pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Dark,
    Light,
}

impl Mode {
    /// Parse the persisted value; anything but `dark`/`light` is unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser tab identifier. Persisted under its decimal string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl TabId {
    pub fn key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session record for one tab.
///
/// `page_is_dark` is unset between the first activation of an unknown tab
/// and the first classification report from its page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_is_dark: Option<bool>,
    #[serde(default)]
    pub css_inserted: bool,
}

impl TabEntry {
    pub const fn pending() -> Self {
        Self {
            page_is_dark: None,
            css_inserted: false,
        }
    }

    pub const fn classified(page_is_dark: bool, css_inserted: bool) -> Self {
        Self {
            page_is_dark: Some(page_is_dark),
            css_inserted,
        }
    }

    /// Only pages reported as light are ever recolored.
    pub fn is_light_page(&self) -> bool {
        self.page_is_dark == Some(false)
    }
}

/// Inbound events, one per browser callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TabEvent {
    Installed,
    Startup,
    /// The user clicked the toolbar button while `tab_id` was active.
    ModeToggled { tab_id: TabId },
    TabActivated { tab_id: TabId },
    /// Content-script report `{ page_is_dark }` from `tab_id`.
    PageClassified { tab_id: TabId, page_is_dark: bool },
    TabRemoved { tab_id: TabId },
}

impl TabEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::Startup => "startup",
            Self::ModeToggled { .. } => "mode_toggled",
            Self::TabActivated { .. } => "tab_activated",
            Self::PageClassified { .. } => "page_classified",
            Self::TabRemoved { .. } => "tab_removed",
        }
    }

    pub fn tab_id(&self) -> Option<TabId> {
        match self {
            Self::Installed | Self::Startup => None,
            Self::ModeToggled { tab_id }
            | Self::TabActivated { tab_id }
            | Self::PageClassified { tab_id, .. }
            | Self::TabRemoved { tab_id } => Some(*tab_id),
        }
    }

    /// Whether handling depends on the persisted mode.
    pub fn reads_mode(&self) -> bool {
        !matches!(self, Self::Installed | Self::TabRemoved { .. })
    }

    /// Whether handling depends on the tab's persisted entry.
    pub fn reads_tab(&self) -> bool {
        matches!(
            self,
            Self::ModeToggled { .. } | Self::TabActivated { .. }
        )
    }
}

/// Side effects requested by the reducer, executed in order by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SetMode { mode: Mode },
    /// Update toolbar icon and title.
    ShowMode { mode: Mode },
    PutTab { tab_id: TabId, entry: TabEntry },
    RemoveTab { tab_id: TabId },
    InsertCss { tab_id: TabId },
    RemoveCss { tab_id: TabId },
    /// Reload bypassing cache, only if the active page is a web page.
    ReloadWebPage { tab_id: TabId },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetMode { .. } => "set_mode",
            Self::ShowMode { .. } => "show_mode",
            Self::PutTab { .. } => "put_tab",
            Self::RemoveTab { .. } => "remove_tab",
            Self::InsertCss { .. } => "insert_css",
            Self::RemoveCss { .. } => "remove_css",
            Self::ReloadWebPage { .. } => "reload",
        }
    }

    /// Failures of cosmetic commands never abandon the rest of an event.
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, Self::ShowMode { .. })
    }
}

/// Persisted view: global mode plus session tab entries.
///
/// `mode` is `None` when the stored value is missing or unrecognized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorState {
    pub mode: Option<Mode>,
    pub tabs: BTreeMap<TabId, TabEntry>,
}

impl CoordinatorState {
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode: Some(mode),
            tabs: BTreeMap::new(),
        }
    }

    pub fn tab(&self, tab_id: TabId) -> Option<&TabEntry> {
        self.tabs.get(&tab_id)
    }

    /// Fold the persistence effect of a command; capability commands are
    /// no-ops here.
    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::SetMode { mode } => self.mode = Some(*mode),
            Command::PutTab { tab_id, entry } => {
                self.tabs.insert(*tab_id, *entry);
            }
            Command::RemoveTab { tab_id } => {
                self.tabs.remove(tab_id);
            }
            Command::ShowMode { .. }
            | Command::InsertCss { .. }
            | Command::RemoveCss { .. }
            | Command::ReloadWebPage { .. } => {}
        }
    }

    /// Tabs whose stylesheet flag contradicts their darkness or the mode.
    pub fn invariant_violations(&self) -> Vec<TabId> {
        self.tabs
            .iter()
            .filter(|(_, entry)| {
                entry.css_inserted && (!entry.is_light_page() || self.mode != Some(Mode::Dark))
            })
            .map(|(id, _)| *id)
            .collect()
    }
}

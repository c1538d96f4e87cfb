//! Pure event reducer.
//!
//! `reduce` decides what should happen for an event given the persisted
//! view and returns the commands to run, in order. The driver executes them
//! against the real store and host; tests fold them with
//! [`CoordinatorState::apply`] to check state evolution without any I/O.

use tracing::warn;

use super::state::{Command, CoordinatorState, Mode, TabEntry, TabEvent, TabId};

/// Compute the next state and the commands that produce it.
pub fn reduce(state: &CoordinatorState, event: &TabEvent) -> (CoordinatorState, Vec<Command>) {
    let commands = plan(state, event);
    let mut next = state.clone();
    for command in &commands {
        next.apply(command);
    }
    (next, commands)
}

fn plan(state: &CoordinatorState, event: &TabEvent) -> Vec<Command> {
    match event {
        // First install always starts dark; reinstalls and upgrades reset it.
        TabEvent::Installed => vec![Command::SetMode { mode: Mode::Dark }],
        TabEvent::Startup => match known_mode(state, event) {
            Some(mode) => vec![Command::ShowMode { mode }],
            None => Vec::new(),
        },
        TabEvent::ModeToggled { tab_id } => toggle(state, event, *tab_id),
        TabEvent::TabActivated { tab_id } => activate(state, event, *tab_id),
        TabEvent::PageClassified {
            tab_id,
            page_is_dark,
        } => classified(state, event, *tab_id, *page_is_dark),
        TabEvent::TabRemoved { tab_id } => vec![Command::RemoveTab { tab_id: *tab_id }],
    }
}

fn known_mode(state: &CoordinatorState, event: &TabEvent) -> Option<Mode> {
    if state.mode.is_none() {
        warn!(event = event.name(), "unrecognized mode, ignoring event");
    }
    state.mode
}

fn toggle(state: &CoordinatorState, event: &TabEvent, tab_id: TabId) -> Vec<Command> {
    let Some(mode) = known_mode(state, event) else {
        return Vec::new();
    };
    let next = mode.toggled();
    let mut commands = vec![
        Command::SetMode { mode: next },
        Command::ShowMode { mode: next },
    ];
    match state.tab(tab_id) {
        Some(entry) => commands.extend(reconcile(next, tab_id, entry)),
        // Unknown tab: a fresh load lets the page report its darkness.
        None => commands.push(Command::ReloadWebPage { tab_id }),
    }
    commands
}

fn activate(state: &CoordinatorState, event: &TabEvent, tab_id: TabId) -> Vec<Command> {
    let Some(entry) = state.tab(tab_id) else {
        return vec![
            Command::PutTab {
                tab_id,
                entry: TabEntry::pending(),
            },
            Command::ReloadWebPage { tab_id },
        ];
    };
    if !entry.is_light_page() {
        return Vec::new();
    }
    match known_mode(state, event) {
        Some(mode) => reconcile(mode, tab_id, entry),
        None => Vec::new(),
    }
}

fn classified(
    state: &CoordinatorState,
    event: &TabEvent,
    tab_id: TabId,
    page_is_dark: bool,
) -> Vec<Command> {
    if page_is_dark {
        return vec![Command::PutTab {
            tab_id,
            entry: TabEntry::classified(true, false),
        }];
    }
    match known_mode(state, event) {
        Some(Mode::Dark) => vec![
            Command::InsertCss { tab_id },
            Command::PutTab {
                tab_id,
                entry: TabEntry::classified(false, true),
            },
        ],
        Some(Mode::Light) => vec![Command::PutTab {
            tab_id,
            entry: TabEntry::classified(false, false),
        }],
        None => Vec::new(),
    }
}

/// Bring a tracked light page in line with `mode`. The entry is persisted
/// only after the capability call, so a failed call leaves it untouched.
fn reconcile(mode: Mode, tab_id: TabId, entry: &TabEntry) -> Vec<Command> {
    if !entry.is_light_page() {
        return Vec::new();
    }
    match (mode, entry.css_inserted) {
        (Mode::Dark, false) => vec![
            Command::InsertCss { tab_id },
            Command::PutTab {
                tab_id,
                entry: TabEntry::classified(false, true),
            },
        ],
        (Mode::Light, true) => vec![
            Command::RemoveCss { tab_id },
            Command::PutTab {
                tab_id,
                entry: TabEntry::classified(false, false),
            },
        ],
        _ => Vec::new(),
    }
}

//! Effectful driver around the reducer.
//!
//! For each event: read what the reducer needs from the store, reduce, then
//! run the commands in order. A failed read abandons the event; a failed
//! command abandons the commands after it unless it is cosmetic. Nothing is
//! retried. The next activation or classification report reconciles.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::host::{ModeBadge, TabHost};
use super::reducer::reduce;
use super::state::{Command, CoordinatorState, Mode, TabEvent, TabId};
use super::store::StateStore;
use crate::config::CoordinatorConfig;
use crate::error::{HostError, StoreError};

/// A step that failed while handling one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// `read_mode`, `read_tab`, or a command name.
    pub step: String,
    pub message: String,
}

/// What happened for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub event: TabEvent,
    pub planned: Vec<Command>,
    pub executed: Vec<Command>,
    /// Reloads skipped because the active page is not a web page.
    pub skipped: Vec<Command>,
    pub cosmetic_failures: Vec<Failure>,
    /// The failure that abandoned the event, if any.
    pub failure: Option<Failure>,
}

impl Outcome {
    fn new(event: &TabEvent) -> Self {
        Self {
            event: event.clone(),
            planned: Vec::new(),
            executed: Vec::new(),
            skipped: Vec::new(),
            cosmetic_failures: Vec::new(),
            failure: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug)]
enum StepError {
    Store(StoreError),
    Host(HostError),
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => write!(f, "{e}"),
            Self::Host(e) => write!(f, "{e}"),
        }
    }
}

impl From<StoreError> for StepError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<HostError> for StepError {
    fn from(e: HostError) -> Self {
        Self::Host(e)
    }
}

enum Executed {
    Done,
    Skipped,
}

/// Per-tab state coordinator.
pub struct Coordinator<S, H> {
    store: S,
    host: H,
    config: CoordinatorConfig,
}

impl<S: StateStore, H: TabHost> Coordinator<S, H> {
    pub fn new(store: S, host: H, config: CoordinatorConfig) -> Self {
        Self {
            store,
            host,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Handle one event to completion or first failure.
    pub async fn handle(&self, event: &TabEvent) -> Outcome {
        let mut outcome = Outcome::new(event);
        let state = match self.load(event).await {
            Ok(state) => state,
            Err((step, e)) => {
                warn!(event = event.name(), step, error = %e, "state read failed, event dropped");
                outcome.failure = Some(Failure {
                    step: step.to_string(),
                    message: e.to_string(),
                });
                return outcome;
            }
        };

        let (_, commands) = reduce(&state, event);
        outcome.planned = commands.clone();

        for command in commands {
            if command.is_cosmetic() {
                self.run_cosmetic(&command, &mut outcome).await;
                outcome.executed.push(command);
                continue;
            }
            match self.execute(&command).await {
                Ok(Executed::Done) => outcome.executed.push(command),
                Ok(Executed::Skipped) => outcome.skipped.push(command),
                Err(e) => {
                    warn!(
                        event = event.name(),
                        tab_id = ?event.tab_id(),
                        step = command.name(),
                        error = %e,
                        "command failed, remaining commands dropped"
                    );
                    outcome.failure = Some(Failure {
                        step: command.name().to_string(),
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }

        debug!(
            event = event.name(),
            planned = outcome.planned.len(),
            executed = outcome.executed.len(),
            "event handled"
        );
        outcome
    }

    /// Handle events strictly one after another.
    pub async fn replay(&self, events: &[TabEvent]) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            outcomes.push(self.handle(event).await);
        }
        outcomes
    }

    async fn load(&self, event: &TabEvent) -> Result<CoordinatorState, (&'static str, StoreError)> {
        let mut state = CoordinatorState::default();
        if event.reads_mode() {
            let raw = self.store.get_mode().await.map_err(|e| ("read_mode", e))?;
            state.mode = raw.as_deref().and_then(Mode::parse);
            if state.mode.is_none() {
                debug!(raw = ?raw, "persisted mode missing or unrecognized");
            }
        }
        if let (true, Some(tab_id)) = (event.reads_tab(), event.tab_id()) {
            let entry = self.store.get_tab(tab_id).await.map_err(|e| ("read_tab", e))?;
            if let Some(entry) = entry {
                state.tabs.insert(tab_id, entry);
            }
        }
        Ok(state)
    }

    async fn execute(&self, command: &Command) -> Result<Executed, StepError> {
        let path = self.config.stylesheet_path.as_str();
        match command {
            Command::SetMode { mode } => {
                self.store.set_mode(*mode).await?;
                info!(%mode, "mode changed");
            }
            Command::PutTab { tab_id, entry } => self.store.put_tab(*tab_id, entry).await?,
            Command::RemoveTab { tab_id } => self.store.remove_tab(*tab_id).await?,
            Command::InsertCss { tab_id } => {
                self.host.insert_css(*tab_id, path).await?;
                debug!(%tab_id, path, "stylesheet inserted");
            }
            Command::RemoveCss { tab_id } => {
                self.host.remove_css(*tab_id, path).await?;
                debug!(%tab_id, path, "stylesheet removed");
            }
            Command::ReloadWebPage { tab_id } => return self.reload_web_page(*tab_id).await,
            Command::ShowMode { .. } => {}
        }
        Ok(Executed::Done)
    }

    /// Run a command whose failures are logged and recorded but never
    /// abandon the event.
    async fn run_cosmetic(&self, command: &Command, outcome: &mut Outcome) {
        if let Command::ShowMode { mode } = command {
            self.show_mode(*mode, outcome).await;
        }
    }

    async fn reload_web_page(&self, tab_id: TabId) -> Result<Executed, StepError> {
        let url = self.host.active_tab_url().await?;
        let scheme = url
            .as_deref()
            .and_then(|u| u.split_once(':'))
            .map(|(scheme, _)| scheme.to_ascii_lowercase());
        let is_web = scheme
            .as_deref()
            .is_some_and(|s| self.config.reload_schemes.iter().any(|allowed| allowed == s));
        if !is_web {
            debug!(%tab_id, url = ?url, "active page is not a web page, reload skipped");
            return Ok(Executed::Skipped);
        }
        self.host.reload(tab_id, self.config.bypass_cache).await?;
        debug!(%tab_id, "tab reloaded");
        Ok(Executed::Done)
    }

    async fn show_mode(&self, mode: Mode, outcome: &mut Outcome) {
        let badge = ModeBadge::for_mode(mode);
        if let Err(e) = self.host.set_icon(&badge.icons).await {
            warn!(%mode, error = %e, "failed to update icon");
            outcome.cosmetic_failures.push(Failure {
                step: "set_icon".to_string(),
                message: e.to_string(),
            });
        }
        if let Err(e) = self.host.set_title(&badge.title).await {
            warn!(%mode, error = %e, "failed to update title");
            outcome.cosmetic_failures.push(Failure {
                step: "set_title".to_string(),
                message: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::host::{HostAction, RecordingHost};
    use crate::coordinator::state::TabEntry;
    use crate::coordinator::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Mutex as StdMutex;

    const TAB: TabId = TabId(42);

    /// Memory store that fails selected operations.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: StdMutex<BTreeSet<&'static str>>,
    }

    impl FlakyStore {
        fn with_mode(mode: Mode) -> Self {
            Self {
                inner: MemoryStore::with_mode(mode),
                failing: StdMutex::new(BTreeSet::new()),
            }
        }

        fn fail(&self, op: &'static str) {
            self.failing.lock().expect("failing lock").insert(op);
        }

        fn check(&self, op: &'static str) -> Result<(), StoreError> {
            if self.failing.lock().expect("failing lock").contains(op) {
                return Err(StoreError::Unavailable(format!("{op} injected failure")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StateStore for FlakyStore {
        async fn get_mode(&self) -> Result<Option<String>, StoreError> {
            self.check("get_mode")?;
            self.inner.get_mode().await
        }

        async fn set_mode(&self, mode: Mode) -> Result<(), StoreError> {
            self.check("set_mode")?;
            self.inner.set_mode(mode).await
        }

        async fn get_tab(&self, tab_id: TabId) -> Result<Option<TabEntry>, StoreError> {
            self.check("get_tab")?;
            self.inner.get_tab(tab_id).await
        }

        async fn put_tab(&self, tab_id: TabId, entry: &TabEntry) -> Result<(), StoreError> {
            self.check("put_tab")?;
            self.inner.put_tab(tab_id, entry).await
        }

        async fn remove_tab(&self, tab_id: TabId) -> Result<(), StoreError> {
            self.check("remove_tab")?;
            self.inner.remove_tab(tab_id).await
        }
    }

    fn coordinator(store: FlakyStore, host: RecordingHost) -> Coordinator<FlakyStore, RecordingHost> {
        Coordinator::new(store, host, CoordinatorConfig::default())
    }

    fn light_report() -> TabEvent {
        TabEvent::PageClassified {
            tab_id: TAB,
            page_is_dark: false,
        }
    }

    // Verifies the full happy path for a light page reported in dark mode.
    #[tokio::test]
    async fn light_report_inserts_stylesheet_and_persists() {
        let c = coordinator(FlakyStore::with_mode(Mode::Dark), RecordingHost::new());
        let outcome = c.handle(&light_report()).await;
        assert!(outcome.is_complete());
        assert_eq!(
            c.host().actions(),
            vec![HostAction::InsertCss {
                tab_id: TAB,
                path: "/src/rules.css".into()
            }]
        );
        assert_eq!(
            c.store().inner.snapshot().tab(TAB),
            Some(&TabEntry::classified(false, true))
        );
    }

    // Verifies a rejected insert leaves the entry unpersisted.
    #[tokio::test]
    async fn failed_insert_skips_persistence() {
        let host = RecordingHost::new();
        host.reject("insert_css");
        let c = coordinator(FlakyStore::with_mode(Mode::Dark), host);
        let outcome = c.handle(&light_report()).await;
        assert_eq!(outcome.failure.as_ref().map(|f| f.step.as_str()), Some("insert_css"));
        assert!(outcome.executed.is_empty());
        assert_eq!(c.store().inner.snapshot().tab(TAB), None);
    }

    #[tokio::test]
    async fn mode_read_failure_abandons_event() {
        let store = FlakyStore::with_mode(Mode::Dark);
        store.fail("get_mode");
        let c = coordinator(store, RecordingHost::new());
        let outcome = c.handle(&light_report()).await;
        assert_eq!(outcome.failure.unwrap().step, "read_mode");
        assert!(outcome.planned.is_empty());
        assert!(c.host().actions().is_empty());
    }

    // Verifies a failed empty-entry write prevents the reload.
    #[tokio::test]
    async fn activation_skips_reload_when_tracking_fails() {
        let store = FlakyStore::with_mode(Mode::Dark);
        store.fail("put_tab");
        let c = coordinator(store, RecordingHost::with_active_url("https://example.com/"));
        let outcome = c.handle(&TabEvent::TabActivated { tab_id: TAB }).await;
        assert_eq!(outcome.failure.unwrap().step, "put_tab");
        assert!(c.host().actions().is_empty());
    }

    #[tokio::test]
    async fn activation_of_unknown_web_tab_reloads_bypassing_cache() {
        let c = coordinator(
            FlakyStore::with_mode(Mode::Dark),
            RecordingHost::with_active_url("https://example.com/"),
        );
        let outcome = c.handle(&TabEvent::TabActivated { tab_id: TAB }).await;
        assert!(outcome.is_complete());
        assert_eq!(
            c.host().actions(),
            vec![HostAction::Reload {
                tab_id: TAB,
                bypass_cache: true
            }]
        );
        assert_eq!(
            c.store().inner.snapshot().tab(TAB),
            Some(&TabEntry::pending())
        );
    }

    // Verifies browser-internal pages are never reloaded.
    #[tokio::test]
    async fn non_web_pages_are_not_reloaded() {
        let c = coordinator(
            FlakyStore::with_mode(Mode::Dark),
            RecordingHost::with_active_url("chrome://extensions"),
        );
        let outcome = c.handle(&TabEvent::TabActivated { tab_id: TAB }).await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.skipped, vec![Command::ReloadWebPage { tab_id: TAB }]);
        assert!(c.host().actions().is_empty());
    }

    // Verifies badge failures are logged but do not stop tab reconciliation.
    #[tokio::test]
    async fn badge_failure_is_cosmetic() {
        let store = FlakyStore::with_mode(Mode::Light);
        store
            .inner
            .seed_tab(TAB, TabEntry::classified(false, false));
        let host = RecordingHost::new();
        host.reject("set_icon");
        let c = coordinator(store, host);
        let outcome = c.handle(&TabEvent::ModeToggled { tab_id: TAB }).await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.cosmetic_failures.len(), 1);
        assert!(outcome.executed.iter().any(Command::is_cosmetic));
        let actions = c.host().actions();
        assert_eq!(
            actions,
            vec![
                HostAction::SetTitle {
                    title: "In dark mode".into()
                },
                HostAction::InsertCss {
                    tab_id: TAB,
                    path: "/src/rules.css".into()
                },
            ]
        );
        let state = c.store().inner.snapshot();
        assert_eq!(state.mode, Some(Mode::Dark));
        assert_eq!(state.tab(TAB), Some(&TabEntry::classified(false, true)));
    }

    // Verifies a failed mode write stops the toggle before any tab change.
    #[tokio::test]
    async fn toggle_abandoned_when_mode_write_fails() {
        let store = FlakyStore::with_mode(Mode::Dark);
        store
            .inner
            .seed_tab(TAB, TabEntry::classified(false, true));
        store.fail("set_mode");
        let c = coordinator(store, RecordingHost::new());
        let outcome = c.handle(&TabEvent::ModeToggled { tab_id: TAB }).await;
        assert_eq!(outcome.failure.unwrap().step, "set_mode");
        assert!(c.host().actions().is_empty());
        assert_eq!(c.store().inner.snapshot().mode, Some(Mode::Dark));
    }

    #[tokio::test]
    async fn unrecognized_mode_is_ignored() {
        let c = Coordinator::new(
            MemoryStore::with_raw_mode("sepia"),
            RecordingHost::new(),
            CoordinatorConfig::default(),
        );
        let outcome = c.handle(&light_report()).await;
        assert!(outcome.is_complete());
        assert!(outcome.planned.is_empty());
        assert!(c.store().snapshot().tabs.is_empty());
    }

    // Verifies an inactive tab missed by a toggle heals on its next activation.
    #[tokio::test]
    async fn stale_tab_heals_on_activation() {
        let c = Coordinator::new(
            MemoryStore::with_mode(Mode::Dark),
            RecordingHost::new(),
            CoordinatorConfig::default(),
        );
        let other = TabId(7);
        c.replay(&[
            TabEvent::PageClassified {
                tab_id: other,
                page_is_dark: false,
            },
            TabEvent::ModeToggled { tab_id: TAB },
        ])
        .await;
        assert_eq!(c.store().snapshot().invariant_violations(), vec![other]);

        c.handle(&TabEvent::TabActivated { tab_id: other }).await;
        assert!(c.store().snapshot().invariant_violations().is_empty());
        assert!(c.host().actions().contains(&HostAction::RemoveCss {
            tab_id: other,
            path: "/src/rules.css".into()
        }));
    }
}

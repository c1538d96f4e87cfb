//! Tab state coordinator.
//!
//! - `state`: mode, per-tab entries, events and commands
//! - `reducer`: pure `(state, event) -> (state, commands)`
//! - `store`: durable mode plus session tab entries
//! - `host`: browser capabilities (reload, stylesheet insert/remove, badge)
//! - `driver`: runs reducer commands against a store and host
//! - `script`: JSON event scripts for offline replay

pub mod driver;
pub mod host;
pub mod reducer;
pub mod script;
pub mod state;
pub mod store;

pub use driver::{Coordinator, Failure, Outcome};
pub use host::{HostAction, ModeBadge, RecordingHost, TabHost};
pub use reducer::reduce;
pub use script::ReplayScript;
pub use state::{Command, CoordinatorState, Mode, TabEntry, TabEvent, TabId};
pub use store::{JsonFileStore, MemoryStore, StateStore};

//! Dimmer: dark-mode decisions for web pages.
//!
//! The crate decides whether a rendered page is already dark, recolors
//! light pages with a fixed rule table, and tracks per-tab stylesheet state
//! across browser events.
//!
//! # Quick start
//!
//! ```no_run
//! use dimmer::classifier::{PageContext, Thresholds};
//! use dimmer::dom::{Document, NodeId};
//!
//! # fn example() -> Result<(), dimmer::error::SnapshotError> {
//! let doc = Document::load(std::path::Path::new("page.json"))?;
//! let mut page = PageContext::<NodeId>::new(Thresholds::default());
//! println!("dark: {}", page.report(&doc).page_is_dark);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod color;
pub mod config;
pub mod coordinator;
pub mod dom;
pub mod error;
pub mod locator;
pub mod logging;
pub mod recolor;
#[cfg(test)]
pub mod testsupport;

//! Recoloring engine.
//!
//! - `rules`: the typed declaration table (common, per-tag, exclusions)
//! - `paint`: one-shot manual recolor of a document, honoring the
//!   colorfulness exceptions
//! - `stylesheet`: static CSS rendering of the same table for insertion by
//!   the coordinator

pub mod paint;
pub mod rules;
pub mod stylesheet;

pub use paint::{paint, PaintReport};
pub use rules::{Palette, Property, Rule, RuleTable, TagName};
pub use stylesheet::render_stylesheet;

//! Narrow interface onto a rendered document.
//!
//! The analysis and painting code never owns DOM nodes. It reads resolved
//! styles and geometry through [`StyleTree`] and writes inline overrides
//! through [`StyleSink`]; node handles are only valid for the current pass.

use serde::{Deserialize, Serialize};

pub mod snapshot;

pub use snapshot::{Document, NodeId, SnapshotFile, SnapshotNode};

/// Border box of an element relative to the viewport origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Dimensions used to decide whether a box is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// `window.innerWidth`.
    pub inner_width: f64,
    /// `document.documentElement.scrollHeight`.
    pub scroll_height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            inner_width: 1280.0,
            scroll_height: 800.0,
        }
    }
}

/// Read access to computed style, geometry and tree structure.
pub trait StyleTree {
    type Node: Copy + Eq + std::fmt::Debug;

    /// The `<html>` element.
    fn document_element(&self) -> Self::Node;

    fn body(&self) -> Option<Self::Node>;

    fn viewport(&self) -> Viewport;

    fn tag_name(&self, node: Self::Node) -> String;

    /// Resolved value of a CSS property, e.g. `background-color`.
    fn computed_style(&self, node: Self::Node, property: &str) -> Option<String>;

    fn bounding_rect(&self, node: Self::Node) -> Rect;

    /// Element children in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Element children of the node's open shadow root, if any.
    fn shadow_children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn is_displayed(&self, node: Self::Node) -> bool {
        self.computed_style(node, "display").as_deref() != Some("none")
    }
}

/// Inline style writes, as done by `element.style.setProperty`.
pub trait StyleSink: StyleTree {
    fn set_property(&mut self, node: Self::Node, property: &str, value: &str, important: bool);
}

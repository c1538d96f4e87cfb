//! Serializable in-memory document.
//!
//! A snapshot captures what a content script would observe on a live page:
//! per-element computed styles, bounding boxes and the element tree
//! (including shadow-root children). The CLI loads snapshots from JSON and
//! the test suites build them with the [`SnapshotNode`] builder methods.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Rect, StyleSink, StyleTree, Viewport};
use crate::error::SnapshotError;

/// Inline declaration written onto an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineDeclaration {
    pub value: String,
    #[serde(default)]
    pub important: bool,
}

/// Nested wire form of one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub tag: String,
    #[serde(default)]
    pub style: BTreeMap<String, String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shadow_children: Vec<SnapshotNode>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inline: BTreeMap<String, InlineDeclaration>,
}

impl SnapshotNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.style.insert(property.to_string(), value.to_string());
        self
    }

    pub fn background(self, value: &str) -> Self {
        self.style("background-color", value)
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Rect::new(x, y, width, height);
        self
    }

    pub fn child(mut self, node: SnapshotNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn shadow_child(mut self, node: SnapshotNode) -> Self {
        self.shadow_children.push(node);
        self
    }
}

/// On-disk snapshot payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub viewport: Viewport,
    pub root: SnapshotNode,
}

/// Handle to an element inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    style: BTreeMap<String, String>,
    rect: Rect,
    children: Vec<NodeId>,
    shadow_children: Vec<NodeId>,
    inline: BTreeMap<String, InlineDeclaration>,
}

/// Arena-backed document implementing the style read/write interface.
#[derive(Debug, Clone)]
pub struct Document {
    viewport: Viewport,
    nodes: Vec<NodeData>,
}

impl Document {
    /// Build a document; `root` is the `<html>` element.
    pub fn new(viewport: Viewport, root: SnapshotNode) -> Self {
        let mut doc = Self {
            viewport,
            nodes: Vec::new(),
        };
        doc.intern(root);
        doc
    }

    pub fn from_file(file: SnapshotFile) -> Self {
        Self::new(file.viewport, file.root)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let file: SnapshotFile = serde_json::from_str(text)?;
        if file.root.tag.trim().is_empty() {
            return Err(SnapshotError::Invalid("root element has no tag".to_string()));
        }
        Ok(Self::from_file(file))
    }

    pub fn to_file(&self) -> SnapshotFile {
        SnapshotFile {
            viewport: self.viewport,
            root: self.export(NodeId(0)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(&self.to_file())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Inline declaration previously written to `node`, if any.
    pub fn inline_value(&self, node: NodeId, property: &str) -> Option<&InlineDeclaration> {
        self.nodes[node.0].inline.get(property)
    }

    /// First element with the given tag in arena order.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.tag.eq_ignore_ascii_case(tag))
            .map(NodeId)
    }

    fn intern(&mut self, node: SnapshotNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag: node.tag,
            style: node.style,
            rect: node.rect,
            children: Vec::new(),
            shadow_children: Vec::new(),
            inline: node.inline,
        });
        let children: Vec<NodeId> = node.children.into_iter().map(|c| self.intern(c)).collect();
        let shadow: Vec<NodeId> = node
            .shadow_children
            .into_iter()
            .map(|c| self.intern(c))
            .collect();
        self.nodes[id.0].children = children;
        self.nodes[id.0].shadow_children = shadow;
        id
    }

    fn export(&self, id: NodeId) -> SnapshotNode {
        let data = &self.nodes[id.0];
        SnapshotNode {
            tag: data.tag.clone(),
            style: data.style.clone(),
            rect: data.rect,
            children: data.children.iter().map(|&c| self.export(c)).collect(),
            shadow_children: data.shadow_children.iter().map(|&c| self.export(c)).collect(),
            inline: data.inline.clone(),
        }
    }
}

impl StyleTree for Document {
    type Node = NodeId;

    fn document_element(&self) -> NodeId {
        NodeId(0)
    }

    fn body(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].tag.eq_ignore_ascii_case("body"))
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.nodes[node.0].tag.to_ascii_uppercase()
    }

    // Important inline declarations win over the captured cascade result.
    fn computed_style(&self, node: NodeId, property: &str) -> Option<String> {
        let data = &self.nodes[node.0];
        if let Some(decl) = data.inline.get(property).filter(|d| d.important) {
            return Some(decl.value.clone());
        }
        data.style.get(property).cloned()
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.nodes[node.0].rect
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn shadow_children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0].shadow_children.clone()
    }
}

impl StyleSink for Document {
    fn set_property(&mut self, node: NodeId, property: &str, value: &str, important: bool) {
        self.nodes[node.0].inline.insert(
            property.to_string(),
            InlineDeclaration {
                value: value.to_string(),
                important,
            },
        );
    }
}

//! Darkness classification of a page.
//!
//! Candidates are checked innermost first: inner container, outer container,
//! `<body>`, `<html>`. The first element whose background yields a verdict
//! decides the page. Pages with no usable background anywhere are light.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{Color, Threshold};
use crate::dom::StyleTree;
use crate::locator::{self, Containers};

/// Default per-channel darkness bound.
pub const DEFAULT_RGB_THRESHOLD: Threshold = Threshold::new(30, 30, 30);
/// Backgrounds at or below this opacity defer to the next candidate.
pub const DEFAULT_ALPHA_THRESHOLD: f32 = 0.1;

/// Verdict for one element's background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Dark,
    Light,
    Unknown,
}

/// Page-level shade; never unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShade {
    Dark,
    Light,
}

impl PageShade {
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }
}

/// Classification parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub rgb: Threshold,
    pub alpha: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rgb: DEFAULT_RGB_THRESHOLD,
            alpha: DEFAULT_ALPHA_THRESHOLD,
        }
    }
}

/// Message the content side sends once per page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationMessage {
    pub page_is_dark: bool,
}

/// Classify a single background-color value.
pub fn background_verdict(background: Option<&str>, thresholds: &Thresholds) -> Verdict {
    let Some(color) = background.and_then(Color::parse) else {
        return Verdict::Unknown;
    };
    if let Some(alpha) = color.alpha {
        if alpha <= thresholds.alpha {
            return Verdict::Unknown;
        }
    }
    if color.is_dark(thresholds.rgb) {
        Verdict::Dark
    } else {
        Verdict::Light
    }
}

pub fn element_verdict<T: StyleTree>(tree: &T, node: T::Node, thresholds: &Thresholds) -> Verdict {
    let background = tree.computed_style(node, "background-color");
    background_verdict(background.as_deref(), thresholds)
}

/// First decisive verdict along `chain`, defaulting to light.
pub fn classify<T: StyleTree>(tree: &T, chain: &[T::Node], thresholds: &Thresholds) -> PageShade {
    for &node in chain {
        match element_verdict(tree, node, thresholds) {
            Verdict::Dark => return PageShade::Dark,
            Verdict::Light => return PageShade::Light,
            Verdict::Unknown => continue,
        }
    }
    PageShade::Light
}

/// Candidate chain in priority order, skipping absent slots.
pub fn candidate_chain<T: StyleTree>(tree: &T, containers: &Containers<T::Node>) -> Vec<T::Node> {
    [
        containers.inner,
        containers.outer,
        tree.body(),
        Some(tree.document_element()),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// State owned by one page load on the content side.
///
/// The first [`report`] runs the locator and classifier; later calls within
/// the same load resend the cached verdict.
///
/// [`report`]: PageContext::report
#[derive(Debug, Clone)]
pub struct PageContext<N> {
    thresholds: Thresholds,
    initialized: bool,
    containers: Containers<N>,
    shade: Option<PageShade>,
}

impl<N: Copy> PageContext<N> {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            initialized: false,
            containers: Containers::default(),
            shade: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn containers(&self) -> Containers<N> {
        self.containers
    }

    pub fn report<T: StyleTree<Node = N>>(&mut self, tree: &T) -> ClassificationMessage {
        if !self.initialized {
            self.containers = locator::locate(tree, self.thresholds.alpha);
            self.initialized = true;
        }
        let shade = match self.shade {
            Some(shade) => shade,
            None => {
                let chain = candidate_chain(tree, &self.containers);
                let shade = classify(tree, &chain, &self.thresholds);
                debug!(?shade, candidates = chain.len(), "classified page");
                self.shade = Some(shade);
                shade
            }
        };
        ClassificationMessage {
            page_is_dark: shade.is_dark(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, SnapshotNode, StyleSink, Viewport};

    fn t() -> Thresholds {
        Thresholds::default()
    }

    // Verifies unknown text, transparency and darkness map to verdicts.
    #[test]
    fn background_verdicts() {
        assert_eq!(background_verdict(None, &t()), Verdict::Unknown);
        assert_eq!(background_verdict(Some("garbage"), &t()), Verdict::Unknown);
        assert_eq!(background_verdict(Some("rgba(0, 0, 0, 0)"), &t()), Verdict::Unknown);
        assert_eq!(background_verdict(Some("rgba(0, 0, 0, 0.1)"), &t()), Verdict::Unknown);
        assert_eq!(background_verdict(Some("rgba(0, 0, 0, 0.2)"), &t()), Verdict::Dark);
        assert_eq!(background_verdict(Some("rgb(30, 30, 30)"), &t()), Verdict::Dark);
        assert_eq!(background_verdict(Some("rgb(31, 30, 30)"), &t()), Verdict::Light);
    }

    fn chain_doc(inner: &str, outer: &str, body: &str, html: &str) -> Document {
        Document::new(
            Viewport::default(),
            SnapshotNode::new("html").background(html).child(
                SnapshotNode::new("body").background(body).child(
                    SnapshotNode::new("main")
                        .background(outer)
                        .rect(0.0, 0.0, 100.0, 100.0)
                        .child(
                            SnapshotNode::new("article")
                                .background(inner)
                                .rect(0.0, 0.0, 50.0, 50.0),
                        ),
                ),
            ),
        )
    }

    // Verifies the first decisive element in the chain wins.
    #[test]
    fn body_decides_when_containers_unknown() {
        let doc = chain_doc("unset", "unset", "rgb(10, 10, 10)", "unset");
        let mut ctx = PageContext::new(t());
        assert_eq!(ctx.report(&doc), ClassificationMessage { page_is_dark: true });
        let found = ctx.containers();
        assert_eq!(doc.tag_name(found.outer.unwrap()), "MAIN");
        assert_eq!(doc.tag_name(found.inner.unwrap()), "ARTICLE");
    }

    #[test]
    fn inner_container_takes_priority() {
        let doc = chain_doc("rgb(250, 250, 250)", "rgb(0, 0, 0)", "rgb(0, 0, 0)", "rgb(0, 0, 0)");
        let mut ctx = PageContext::new(t());
        assert!(!ctx.report(&doc).page_is_dark);
    }

    // Verifies an all-unknown chain falls back to light.
    #[test]
    fn all_unknown_defaults_to_light() {
        let doc = chain_doc("x", "rgba(0, 0, 0, 0)", "y", "z");
        let chain = candidate_chain(&doc, &locator::locate(&doc, 0.1));
        assert_eq!(chain.len(), 4);
        assert_eq!(classify(&doc, &chain, &t()), PageShade::Light);
        assert_eq!(classify(&doc, &[], &t()), PageShade::Light);
    }

    // Verifies a second report in the same page load reuses the cached verdict.
    #[test]
    fn repeat_report_uses_cached_verdict() {
        let mut doc = chain_doc("unset", "unset", "rgb(10, 10, 10)", "unset");
        let mut ctx = PageContext::new(t());
        assert!(!ctx.is_initialized());
        assert!(ctx.report(&doc).page_is_dark);
        assert!(ctx.is_initialized());

        let body = doc.body().unwrap();
        doc.set_property(body, "background-color", "rgb(255, 255, 255)", true);
        assert!(ctx.report(&doc).page_is_dark);
    }

    #[test]
    fn message_wire_format() {
        let json = serde_json::to_string(&ClassificationMessage { page_is_dark: false }).unwrap();
        assert_eq!(json, r#"{"page_is_dark":false}"#);
    }
}

//! Heuristic lookup of the element hosting a page's main content.
//!
//! No semantic HTML knowledge is used. The outer pass picks the largest
//! on-screen direct child of `<body>`; the inner pass then picks the
//! largest non-transparent displayed descendant of that block (shadow-root
//! children included), which usually tracks the reading surface more
//! closely than `<body>` itself.

use tracing::debug;

use crate::color::Color;
use crate::dom::{Rect, StyleTree, Viewport};

/// Result of both passes. Either slot may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Containers<N> {
    pub outer: Option<N>,
    pub inner: Option<N>,
}

impl<N> Default for Containers<N> {
    fn default() -> Self {
        Self {
            outer: None,
            inner: None,
        }
    }
}

/// Run the outer pass from `<body>` and the inner pass below its winner.
pub fn locate<T: StyleTree>(tree: &T, alpha_cutoff: f32) -> Containers<T::Node> {
    let Some(body) = tree.body() else {
        return Containers::default();
    };
    let outer = find_outer_container(tree, body);
    let inner = outer.and_then(|outer| find_inner_container(tree, outer, alpha_cutoff));
    debug!(outer = ?outer, inner = ?inner, "located main containers");
    Containers { outer, inner }
}

/// Largest displayed direct child of `parent` that intersects the page.
///
/// Ties keep the first candidate found; zero-area boxes never win.
pub fn find_outer_container<T: StyleTree>(tree: &T, parent: T::Node) -> Option<T::Node> {
    let viewport = tree.viewport();
    let mut best: Option<(T::Node, f64)> = None;
    for child in tree.children(parent) {
        if !tree.is_displayed(child) {
            continue;
        }
        let rect = tree.bounding_rect(child);
        if !intersects_page(&rect, &viewport) {
            continue;
        }
        let area = rect.area();
        let best_area = best.map_or(0.0, |(_, a)| a);
        if area > best_area {
            best = Some((child, area));
        }
    }
    best.map(|(node, _)| node)
}

/// Largest displayed, non-transparent descendant of `root`.
///
/// Visits light-tree children before shadow-root children, in pre-order,
/// and lets later elements win ties. `root` itself is never a candidate.
pub fn find_inner_container<T: StyleTree>(
    tree: &T,
    root: T::Node,
    alpha_cutoff: f32,
) -> Option<T::Node> {
    let mut best: Option<(T::Node, f64)> = None;
    let mut stack = Vec::new();
    push_children(tree, root, &mut stack);

    while let Some(node) = stack.pop() {
        if !is_transparent(tree, node, alpha_cutoff) && tree.is_displayed(node) {
            let area = tree.bounding_rect(node).area();
            let best_area = best.map_or(0.0, |(_, a)| a);
            if area >= best_area {
                best = Some((node, area));
            }
        }
        push_children(tree, node, &mut stack);
    }
    best.map(|(node, _)| node)
}

fn push_children<T: StyleTree>(tree: &T, node: T::Node, stack: &mut Vec<T::Node>) {
    // Reversed so pops come out in document order, light tree first.
    stack.extend(tree.shadow_children(node).into_iter().rev());
    stack.extend(tree.children(node).into_iter().rev());
}

/// Box intersects `[0, inner_width)` horizontally and `[0, scroll_height)`
/// vertically. The far edges are inclusive, so a box ending exactly at 0
/// still counts.
pub fn intersects_page(rect: &Rect, viewport: &Viewport) -> bool {
    rect.x < viewport.inner_width
        && rect.x + rect.width >= 0.0
        && rect.y < viewport.scroll_height
        && rect.y + rect.height >= 0.0
}

/// Background alpha strictly below the cutoff. Unparsable backgrounds are
/// treated as opaque.
fn is_transparent<T: StyleTree>(tree: &T, node: T::Node, alpha_cutoff: f32) -> bool {
    tree.computed_style(node, "background-color")
        .and_then(|text| Color::parse(&text))
        .is_some_and(|c| c.opacity() < alpha_cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, SnapshotNode};

    const OPAQUE: &str = "rgb(255, 255, 255)";

    fn page(body: SnapshotNode) -> Document {
        Document::new(
            Viewport {
                inner_width: 1000.0,
                scroll_height: 2000.0,
            },
            SnapshotNode::new("html").child(body),
        )
    }

    // Verifies the outer pass picks the larger of two visible siblings.
    #[test]
    fn outer_picks_largest_visible_child() {
        let doc = page(
            SnapshotNode::new("body")
                .child(SnapshotNode::new("nav").rect(0.0, 0.0, 10.0, 10.0))
                .child(SnapshotNode::new("main").rect(0.0, 10.0, 20.0, 20.0)),
        );
        let outer = find_outer_container(&doc, doc.body().unwrap()).unwrap();
        assert_eq!(doc.tag_name(outer), "MAIN");
    }

    // Verifies off-screen boxes never win regardless of their area.
    #[test]
    fn outer_ignores_offscreen_children() {
        let doc = page(
            SnapshotNode::new("body")
                .child(SnapshotNode::new("aside").rect(1000.0, 0.0, 900.0, 900.0))
                .child(SnapshotNode::new("aside").rect(-500.0, 0.0, 400.0, 900.0))
                .child(SnapshotNode::new("main").rect(0.0, 0.0, 10.0, 10.0)),
        );
        let outer = find_outer_container(&doc, doc.body().unwrap()).unwrap();
        assert_eq!(doc.tag_name(outer), "MAIN");
    }

    // Verifies hidden children are skipped and equal areas keep the first.
    #[test]
    fn outer_skips_hidden_and_keeps_first_on_tie() {
        let doc = page(
            SnapshotNode::new("body")
                .child(
                    SnapshotNode::new("dialog")
                        .style("display", "none")
                        .rect(0.0, 0.0, 500.0, 500.0),
                )
                .child(SnapshotNode::new("header").rect(0.0, 0.0, 10.0, 10.0))
                .child(SnapshotNode::new("footer").rect(0.0, 20.0, 10.0, 10.0)),
        );
        let outer = find_outer_container(&doc, doc.body().unwrap()).unwrap();
        assert_eq!(doc.tag_name(outer), "HEADER");
    }

    #[test]
    fn empty_body_has_no_containers() {
        let doc = page(SnapshotNode::new("body"));
        assert_eq!(locate(&doc, 0.1), Containers::default());
    }

    // Verifies the inner pass prefers the later element on equal area and
    // descends into shadow roots.
    #[test]
    fn inner_prefers_later_on_tie_and_sees_shadow_children() {
        let doc = page(
            SnapshotNode::new("body").child(
                SnapshotNode::new("div")
                    .rect(0.0, 0.0, 100.0, 100.0)
                    .child(
                        SnapshotNode::new("section")
                            .background(OPAQUE)
                            .rect(0.0, 0.0, 50.0, 50.0),
                    )
                    .shadow_child(
                        SnapshotNode::new("article")
                            .background(OPAQUE)
                            .rect(0.0, 0.0, 50.0, 50.0),
                    ),
            ),
        );
        let found = locate(&doc, 0.1);
        assert_eq!(doc.tag_name(found.outer.unwrap()), "DIV");
        assert_eq!(doc.tag_name(found.inner.unwrap()), "ARTICLE");
    }

    // Verifies transparent and hidden descendants are not candidates but
    // their subtrees are still searched.
    #[test]
    fn inner_skips_transparent_but_descends() {
        let doc = page(
            SnapshotNode::new("body").child(
                SnapshotNode::new("div").rect(0.0, 0.0, 100.0, 100.0).child(
                    SnapshotNode::new("div")
                        .background("rgba(0, 0, 0, 0)")
                        .rect(0.0, 0.0, 90.0, 90.0)
                        .child(
                            SnapshotNode::new("p")
                                .background(OPAQUE)
                                .rect(0.0, 0.0, 20.0, 20.0),
                        )
                        .child(
                            SnapshotNode::new("img")
                                .style("display", "none")
                                .rect(0.0, 0.0, 80.0, 80.0),
                        ),
                ),
            ),
        );
        let found = locate(&doc, 0.1);
        assert_eq!(doc.tag_name(found.inner.unwrap()), "P");
    }

    #[test]
    fn page_band_edges() {
        let vp = Viewport {
            inner_width: 100.0,
            scroll_height: 100.0,
        };
        assert!(intersects_page(&Rect::new(99.0, 0.0, 1.0, 1.0), &vp));
        assert!(!intersects_page(&Rect::new(100.0, 0.0, 1.0, 1.0), &vp));
        // Right edge touching 0 is inside.
        assert!(intersects_page(&Rect::new(-10.0, 0.0, 10.0, 1.0), &vp));
        assert!(intersects_page(&Rect::new(0.0, -5.0, 1.0, 5.0), &vp));
        assert!(!intersects_page(&Rect::new(-10.0, 0.0, 9.0, 1.0), &vp));
        assert!(!intersects_page(&Rect::new(0.0, 100.0, 1.0, 1.0), &vp));
    }
}

//! One-shot manual recolor of a whole document.
//!
//! Walks the element tree from `<html>` in pre-order with an explicit
//! stack. Excluded tags are not styled, but their children are still
//! visited. Computed colors are sampled before any write to the element so
//! the colorfulness checks see the page author's values.

use tracing::debug;

use super::rules::{Property, Rule, RuleTable, TagName};
use crate::color::{self, Color};
use crate::dom::StyleSink;

/// Counters describing one paint pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintReport {
    pub visited: usize,
    pub styled: usize,
    pub excluded: usize,
    pub preserved_text: usize,
    pub preserved_background: usize,
    pub declarations: usize,
}

/// Apply the rule table to every element of `doc`.
pub fn paint<S: StyleSink>(doc: &mut S, table: &RuleTable) -> PaintReport {
    let mut report = PaintReport::default();
    let mut stack = vec![doc.document_element()];

    while let Some(node) = stack.pop() {
        report.visited += 1;
        let tag = TagName::parse(&doc.tag_name(node));
        if table.is_excluded(&tag) {
            report.excluded += 1;
        } else {
            style_element(doc, node, &tag, table, &mut report);
            report.styled += 1;
        }
        stack.extend(doc.children(node).into_iter().rev());
    }

    debug!(
        visited = report.visited,
        styled = report.styled,
        excluded = report.excluded,
        "painted document"
    );
    report
}

struct Sampled {
    color: Option<String>,
    background: Option<String>,
    background_color: Option<String>,
}

impl Sampled {
    fn get(&self, property: Property) -> Option<&str> {
        match property {
            Property::Color => self.color.as_deref(),
            Property::Background => self.background.as_deref(),
            Property::BackgroundColor => self.background_color.as_deref(),
            _ => None,
        }
    }
}

fn style_element<S: StyleSink>(
    doc: &mut S,
    node: S::Node,
    tag: &TagName,
    table: &RuleTable,
    report: &mut PaintReport,
) {
    let sampled = Sampled {
        color: doc.computed_style(node, Property::Color.css_name()),
        background: doc.computed_style(node, Property::Background.css_name()),
        background_color: doc.computed_style(node, Property::BackgroundColor.css_name()),
    };
    let palette = &table.palette;

    for rule in &table.common {
        if rule.property == Property::Color && palette.preserve_text_colors {
            let colorful = sampled
                .get(Property::Color)
                .and_then(Color::parse)
                .is_some_and(|c| !c.is_neutral(palette.text_neutral_distance));
            if colorful {
                report.preserved_text += 1;
                continue;
            }
        }

        if rule.property.is_background()
            && palette.preserve_background_colors
            && !table.forces_background(tag)
        {
            let Some(original) = sampled.get(rule.property).map(leading_color) else {
                continue;
            };
            match Color::parse(original) {
                Some(c) if c.is_neutral(palette.background_neutral_distance) => {
                    let value = color::recolor(palette.background, original);
                    set(doc, node, rule.property, &value, true, report);
                }
                Some(_) => report.preserved_background += 1,
                None => {}
            }
            continue;
        }

        apply(doc, node, rule, report);
    }

    for rule in table.overrides_for(tag) {
        apply(doc, node, rule, report);
    }
}

/// Color token at the start of a possibly longer shorthand value such as
/// `rgba(0, 0, 0, 0) none repeat scroll 0% 0%`.
fn leading_color(text: &str) -> &str {
    let text = text.trim_start();
    match text.find(')') {
        Some(end) => &text[..=end],
        None => text,
    }
}

fn apply<S: StyleSink>(doc: &mut S, node: S::Node, rule: &Rule, report: &mut PaintReport) {
    set(doc, node, rule.property, &rule.value, rule.important, report);
}

fn set<S: StyleSink>(
    doc: &mut S,
    node: S::Node,
    property: Property,
    value: &str,
    important: bool,
    report: &mut PaintReport,
) {
    doc.set_property(node, property.css_name(), value, important);
    report.declarations += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, NodeId, SnapshotNode, StyleTree};
    use crate::recolor::rules::Palette;
    use crate::testsupport::page;

    fn inline(doc: &Document, node: NodeId, property: &str) -> Option<String> {
        doc.inline_value(node, property).map(|d| d.value.clone())
    }

    fn doc_with(body: SnapshotNode) -> Document {
        page(body)
    }

    // Verifies gray text is forced white while accent text keeps its color.
    #[test]
    fn preserves_colorful_text() {
        let mut doc = doc_with(
            SnapshotNode::new("body")
                .child(SnapshotNode::new("span").style("color", "rgb(90, 90, 100)"))
                .child(SnapshotNode::new("em").style("color", "rgb(200, 20, 20)")),
        );
        let report = paint(&mut doc, &RuleTable::default());
        let span = doc.find_by_tag("span").unwrap();
        let em = doc.find_by_tag("em").unwrap();
        assert_eq!(inline(&doc, span, "color").as_deref(), Some("white"));
        assert_eq!(inline(&doc, em, "color"), None);
        assert_eq!(report.preserved_text, 1);
    }

    // Verifies neutral backgrounds are recolored keeping alpha, colorful ones kept.
    #[test]
    fn recolors_neutral_backgrounds_keeping_alpha() {
        let mut doc = doc_with(
            SnapshotNode::new("body")
                .child(
                    SnapshotNode::new("div")
                        .background("rgba(250, 250, 250, 0.6)")
                        .style("background", "rgba(250, 250, 250, 0.6) none repeat scroll 0% 0%"),
                )
                .child(SnapshotNode::new("section").background("rgb(30, 120, 220)")),
        );
        let report = paint(&mut doc, &RuleTable::default());
        let div = doc.find_by_tag("div").unwrap();
        let section = doc.find_by_tag("section").unwrap();
        assert_eq!(
            inline(&doc, div, "background-color").as_deref(),
            Some("rgba(27, 27, 27, 0.6)")
        );
        assert_eq!(
            inline(&doc, div, "background").as_deref(),
            Some("rgba(27, 27, 27, 0.6)")
        );
        assert_eq!(inline(&doc, section, "background-color"), None);
        assert_eq!(report.preserved_background, 1);
    }

    // Verifies html/body/img always receive the dark background.
    #[test]
    fn forced_tags_get_background_even_when_colorful() {
        let mut doc = doc_with(
            SnapshotNode::new("body")
                .background("rgb(255, 240, 0)")
                .child(SnapshotNode::new("img").background("rgb(0, 200, 0)")),
        );
        paint(&mut doc, &RuleTable::default());
        let body = doc.body().unwrap();
        let img = doc.find_by_tag("img").unwrap();
        assert_eq!(
            inline(&doc, body, "background-color").as_deref(),
            Some("rgb(27, 27, 27)")
        );
        // The per-tag override lands after the common rule.
        assert_eq!(inline(&doc, img, "background-color").as_deref(), Some("white"));
        assert_eq!(inline(&doc, img, "color").as_deref(), Some("black"));
    }

    // Verifies excluded tags are skipped but their descendants are styled.
    #[test]
    fn excluded_tags_are_skipped_but_traversed() {
        let mut doc = doc_with(
            SnapshotNode::new("body").child(
                SnapshotNode::new("noscript").child(SnapshotNode::new("p").style("color", "rgb(0, 0, 0)")),
            ),
        );
        let report = paint(&mut doc, &RuleTable::default());
        let noscript = doc.find_by_tag("noscript").unwrap();
        let p = doc.find_by_tag("p").unwrap();
        assert_eq!(inline(&doc, noscript, "color"), None);
        assert_eq!(inline(&doc, p, "color").as_deref(), Some("white"));
        assert_eq!(inline(&doc, p, "opacity").as_deref(), Some("1"));
        // head, style, noscript
        assert_eq!(report.excluded, 3);
        assert_eq!(report.visited, 6);
    }

    #[test]
    fn anchors_get_transparent_background() {
        let mut doc = doc_with(SnapshotNode::new("body").child(SnapshotNode::new("a")));
        paint(&mut doc, &RuleTable::default());
        let a = doc.find_by_tag("a").unwrap();
        assert_eq!(
            inline(&doc, a, "background-color").as_deref(),
            Some("transparent")
        );
        assert!(doc.inline_value(a, "opacity").unwrap().important);
    }

    // Verifies disabling preservation forces the palette everywhere.
    #[test]
    fn preservation_can_be_disabled() {
        let palette = Palette {
            preserve_text_colors: false,
            preserve_background_colors: false,
            ..Palette::default()
        };
        let mut doc = doc_with(
            SnapshotNode::new("body").child(
                SnapshotNode::new("em")
                    .style("color", "rgb(200, 20, 20)")
                    .background("rgb(30, 120, 220)"),
            ),
        );
        paint(&mut doc, &RuleTable::with_palette(palette));
        let em = doc.find_by_tag("em").unwrap();
        assert_eq!(inline(&doc, em, "color").as_deref(), Some("white"));
        assert_eq!(
            inline(&doc, em, "background-color").as_deref(),
            Some("rgb(27, 27, 27)")
        );
    }

    #[test]
    fn deep_trees_do_not_recurse() {
        let mut node = SnapshotNode::new("div");
        for _ in 0..500 {
            node = SnapshotNode::new("div").child(node);
        }
        let mut doc = doc_with(SnapshotNode::new("body").child(node));
        let report = paint(&mut doc, &RuleTable::default());
        assert_eq!(report.visited, 501 + 4);
    }
}

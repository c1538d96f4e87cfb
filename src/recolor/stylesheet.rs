//! Rendering of the rule table as a static stylesheet.
//!
//! This is the asset the coordinator inserts into tabs. Plain CSS cannot
//! express the colorfulness exceptions, so the stylesheet applies the common
//! rules unconditionally; the page-level dark/light verdict decides whether
//! it is inserted at all.

use std::fmt::Write;

use super::rules::{Rule, RuleTable};

/// Render the whole table.
///
/// The common block targets every element except the excluded tags through a
/// single `:not()` list, which scores like one type selector. Per-tag blocks
/// score the same and come later, so their `!important` rules win.
pub fn render_stylesheet(table: &RuleTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "/* generated by dimmer {} */", env!("CARGO_PKG_VERSION"));
    write_block(&mut out, &common_selector(table), &table.common);

    for (tag, rules) in &table.per_tag {
        if rules.is_empty() {
            continue;
        }
        write_block(&mut out, tag.as_str(), rules);
    }
    out
}

/// `*` alone when nothing is excluded, else `*:not(a, b, ...)`.
fn common_selector(table: &RuleTable) -> String {
    if table.excluded.is_empty() {
        return "*".to_string();
    }
    let tags: Vec<&str> = table.excluded.iter().map(|tag| tag.as_str()).collect();
    format!("*:not({})", tags.join(", "))
}

fn write_block(out: &mut String, selector: &str, rules: &[Rule]) {
    let _ = writeln!(out, "\n{selector} {{");
    for rule in rules {
        let priority = if rule.important { " !important" } else { "" };
        let _ = writeln!(out, "  {}: {}{priority};", rule.property, rule.value);
    }
    out.push_str("}\n");
}

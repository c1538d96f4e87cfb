//! Declarative recolor rule table.
//!
//! The table has four parts: a common rule list applied to every styled
//! element, per-tag overrides applied after it, tags that are never styled,
//! and tags whose background is always replaced even when it looks colorful.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// CSS properties touched by the recolor engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
    Color,
    Background,
    BackgroundColor,
    BorderColor,
    BorderTopColor,
    BorderRightColor,
    BorderBottomColor,
    BorderLeftColor,
    OutlineColor,
    CaretColor,
    ColumnRuleColor,
    TextShadow,
    BoxShadow,
    Opacity,
}

impl Property {
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Background => "background",
            Self::BackgroundColor => "background-color",
            Self::BorderColor => "border-color",
            Self::BorderTopColor => "border-top-color",
            Self::BorderRightColor => "border-right-color",
            Self::BorderBottomColor => "border-bottom-color",
            Self::BorderLeftColor => "border-left-color",
            Self::OutlineColor => "outline-color",
            Self::CaretColor => "caret-color",
            Self::ColumnRuleColor => "column-rule-color",
            Self::TextShadow => "text-shadow",
            Self::BoxShadow => "box-shadow",
            Self::Opacity => "opacity",
        }
    }

    pub fn is_background(self) -> bool {
        matches!(self, Self::Background | Self::BackgroundColor)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

/// Element names the table refers to. Everything else is `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagName {
    Html,
    Body,
    Div,
    Span,
    P,
    A,
    Img,
    Head,
    Link,
    Style,
    Title,
    Meta,
    Base,
    Br,
    Wbr,
    Script,
    Noscript,
    Progress,
    Embed,
    Iframe,
    Object,
    Portal,
    Source,
    Other(String),
}

impl TagName {
    /// Case-insensitive lookup of a DOM `tagName`.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "html" => Self::Html,
            "body" => Self::Body,
            "div" => Self::Div,
            "span" => Self::Span,
            "p" => Self::P,
            "a" => Self::A,
            "img" => Self::Img,
            "head" => Self::Head,
            "link" => Self::Link,
            "style" => Self::Style,
            "title" => Self::Title,
            "meta" => Self::Meta,
            "base" => Self::Base,
            "br" => Self::Br,
            "wbr" => Self::Wbr,
            "script" => Self::Script,
            "noscript" => Self::Noscript,
            "progress" => Self::Progress,
            "embed" => Self::Embed,
            "iframe" => Self::Iframe,
            "object" => Self::Object,
            "portal" => Self::Portal,
            "source" => Self::Source,
            other => Self::Other(other.to_string()),
        }
    }

    /// Lowercase selector form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Html => "html",
            Self::Body => "body",
            Self::Div => "div",
            Self::Span => "span",
            Self::P => "p",
            Self::A => "a",
            Self::Img => "img",
            Self::Head => "head",
            Self::Link => "link",
            Self::Style => "style",
            Self::Title => "title",
            Self::Meta => "meta",
            Self::Base => "base",
            Self::Br => "br",
            Self::Wbr => "wbr",
            Self::Script => "script",
            Self::Noscript => "noscript",
            Self::Progress => "progress",
            Self::Embed => "embed",
            Self::Iframe => "iframe",
            Self::Object => "object",
            Self::Portal => "portal",
            Self::Source => "source",
            Self::Other(name) => name,
        }
    }
}

/// One `property: value [!important]` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub property: Property,
    pub value: String,
    pub important: bool,
}

impl Rule {
    pub fn important(property: Property, value: impl Into<String>) -> Self {
        Self {
            property,
            value: value.into(),
            important: true,
        }
    }
}

/// Tunables of the dark palette and the colorfulness exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Replacement background for neutral surfaces.
    pub background: [u8; 3],
    /// Keep the original text color when it is not gray.
    pub preserve_text_colors: bool,
    pub text_neutral_distance: u8,
    /// Keep the original background when it is not gray.
    pub preserve_background_colors: bool,
    pub background_neutral_distance: u8,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: [27, 27, 27],
            preserve_text_colors: true,
            text_neutral_distance: 40,
            preserve_background_colors: true,
            background_neutral_distance: 15,
        }
    }
}

impl Palette {
    pub fn background_css(&self) -> String {
        let [r, g, b] = self.background;
        format!("rgb({r}, {g}, {b})")
    }
}

/// Complete rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    pub palette: Palette,
    pub common: Vec<Rule>,
    pub per_tag: BTreeMap<TagName, Vec<Rule>>,
    pub excluded: BTreeSet<TagName>,
    pub forced_background: BTreeSet<TagName>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::with_palette(Palette::default())
    }
}

impl RuleTable {
    pub fn with_palette(palette: Palette) -> Self {
        use Property::*;

        let common = vec![
            Rule::important(Color, "white"),
            Rule::important(Background, palette.background_css()),
            Rule::important(BackgroundColor, palette.background_css()),
            Rule::important(BorderColor, "white"),
            Rule::important(TextShadow, "none"),
            Rule::important(BoxShadow, "none"),
            Rule::important(BorderBottomColor, "white"),
            Rule::important(BorderLeftColor, "white"),
            Rule::important(BorderRightColor, "white"),
            Rule::important(BorderTopColor, "white"),
            Rule::important(CaretColor, "white"),
            Rule::important(ColumnRuleColor, "white"),
            Rule::important(OutlineColor, "white"),
        ];

        let mut per_tag = BTreeMap::new();
        per_tag.insert(TagName::P, vec![Rule::important(Opacity, "1")]);
        // Transparent anchors keep the surrounding surface visible behind links.
        per_tag.insert(
            TagName::A,
            vec![
                Rule::important(Opacity, "1"),
                Rule::important(BackgroundColor, "transparent"),
            ],
        );
        // Alt text on a white fallback behind transparent images.
        per_tag.insert(
            TagName::Img,
            vec![
                Rule::important(Color, "black"),
                Rule::important(BackgroundColor, "white"),
            ],
        );

        let excluded = [
            TagName::Head,
            TagName::Link,
            TagName::Style,
            TagName::Title,
            TagName::Meta,
            TagName::Base,
            TagName::Br,
            TagName::Wbr,
            TagName::Script,
            TagName::Noscript,
            TagName::Progress,
            TagName::Embed,
            TagName::Iframe,
            TagName::Object,
            TagName::Portal,
            TagName::Source,
        ]
        .into_iter()
        .collect();

        let forced_background = [TagName::Html, TagName::Body, TagName::Img]
            .into_iter()
            .collect();

        Self {
            palette,
            common,
            per_tag,
            excluded,
            forced_background,
        }
    }

    pub fn is_excluded(&self, tag: &TagName) -> bool {
        self.excluded.contains(tag)
    }

    pub fn overrides_for(&self, tag: &TagName) -> &[Rule] {
        self.per_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn forces_background(&self, tag: &TagName) -> bool {
        self.forced_background.contains(tag)
    }
}

//! RGB(A) color codec for computed-style values.
//!
//! Only the two forms browsers emit for resolved colors are understood:
//! `rgb(r, g, b)` and `rgba(r, g, b, a)`. Anything else parses to `None`;
//! callers treat that as "unknown" and never substitute a default color.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed computed color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// `None` means fully opaque (the `rgb(...)` form).
    pub alpha: Option<f32>,
}

/// Per-channel upper bounds used by the darkness test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Threshold {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Threshold {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Threshold {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Threshold> for [u8; 3] {
    fn from(t: Threshold) -> Self {
        [t.r, t.g, t.b]
    }
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            alpha: None,
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self {
            r,
            g,
            b,
            alpha: Some(alpha),
        }
    }

    /// Parse `rgb(...)`/`rgba(...)` text (case-insensitive, flexible spacing).
    pub fn parse(text: &str) -> Option<Self> {
        parse_with_form(text).map(|(color, _)| color)
    }

    /// True when every pairwise channel delta is within `distance`, i.e. the
    /// color reads as a shade of gray rather than an accent color.
    pub fn is_neutral(&self, distance: u8) -> bool {
        let spread = self.r.abs_diff(self.g).max(self.r.abs_diff(self.b)).max(self.g.abs_diff(self.b));
        spread <= distance
    }

    /// True when every channel is at or below its threshold.
    pub fn is_dark(&self, threshold: Threshold) -> bool {
        self.r <= threshold.r && self.g <= threshold.g && self.b <= threshold.b
    }

    /// Opacity in `[0, 1]`, treating the 3-channel form as opaque.
    pub fn opacity(&self) -> f32 {
        self.alpha.unwrap_or(1.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alpha {
            Some(a) => write!(f, "rgba({}, {}, {}, {a})", self.r, self.g, self.b),
            None => write!(f, "rgb({}, {}, {})", self.r, self.g, self.b),
        }
    }
}

/// Substitute the RGB channels of `text` with `rgb`, keeping its alpha and
/// its textual form (3 vs 4 channels, separator spacing).
///
/// Unparsable input is returned unchanged.
pub fn recolor(rgb: [u8; 3], text: &str) -> String {
    let Some((color, form)) = parse_with_form(text) else {
        return text.to_string();
    };
    let sep = if form.spaced { ", " } else { "," };
    let [r, g, b] = rgb;
    match color.alpha {
        Some(a) => format!("rgba({r}{sep}{g}{sep}{b}{sep}{a})"),
        None => format!("rgb({r}{sep}{g}{sep}{b})"),
    }
}

struct TextForm {
    spaced: bool,
}

fn parse_with_form(text: &str) -> Option<(Color, TextForm)> {
    let lowered = text.trim().to_ascii_lowercase();
    let (inner, with_alpha) = if let Some(rest) = lowered.strip_prefix("rgba(") {
        (rest.strip_suffix(')')?, true)
    } else if let Some(rest) = lowered.strip_prefix("rgb(") {
        (rest.strip_suffix(')')?, false)
    } else {
        return None;
    };

    let parts: Vec<&str> = inner.split(',').collect();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }
    let spaced = parts[1..].iter().any(|p| p.starts_with(char::is_whitespace));

    let channel = |raw: &str| -> Option<u8> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u8>().ok()
    };
    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;

    let alpha = if with_alpha {
        let raw = parts[3].trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return None;
        }
        let a = raw.parse::<f32>().ok()?;
        if !(0.0..=1.0).contains(&a) {
            return None;
        }
        Some(a)
    } else {
        None
    };

    Some((Color { r, g, b, alpha }, TextForm { spaced }))
}

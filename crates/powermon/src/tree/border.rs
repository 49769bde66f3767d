use std::fmt;

use serde::Serialize;

/// Color of the untracked share of a split border.
pub const NEUTRAL_COLOR: &str = "grey";

/// Color of a solid border and of the tracked share of a split one.
pub const ACCENT_COLOR: &str = "mediumseagreen";

/// Circular indicator drawn around a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BorderStyle {
    Solid,
    /// Neutral for `untracked_percent`, accent for the rest.
    Split { untracked_percent: u32 },
}

impl BorderStyle {
    /// Short human-readable form, used by text renderers.
    pub fn label(&self) -> String {
        match self {
            BorderStyle::Solid => "solid".to_string(),
            BorderStyle::Split { untracked_percent } => format!("split {untracked_percent}%"),
        }
    }
}

/// Renders the CSS `background` value for the border ring.
impl fmt::Display for BorderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorderStyle::Solid => write!(
                f,
                "conic-gradient(from 0deg, {ACCENT_COLOR}, {ACCENT_COLOR}) border-box"
            ),
            BorderStyle::Split { untracked_percent: p } => write!(
                f,
                "conic-gradient(from 0deg, {NEUTRAL_COLOR} 0% {p}%, {ACCENT_COLOR} {p}% 100%) border-box"
            ),
        }
    }
}

/// Pick the border for a node.
pub fn border_style(percentage: u32, untracked: Option<f64>, show_untracked: bool) -> BorderStyle {
    match untracked {
        Some(u) if !u.is_nan() && show_untracked && percentage > 0 => BorderStyle::Split {
            untracked_percent: percentage,
        },
        _ => BorderStyle::Solid,
    }
}

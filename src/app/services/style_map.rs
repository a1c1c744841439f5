use std::collections::BTreeSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::app::domain::styles::{Color, StyleKind, StyleRangeSet};

/// Background painted behind search matches.
pub const HIGHLIGHT_BACKGROUND: Color = Color::YELLOW;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: u32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: u32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

/// Effective attributes of a run of text, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStyle {
    pub family: String,
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub range: Range<usize>,
    pub style: ResolvedStyle,
}

/// Compute the attributes for a set of active tags on top of the base font.
///
/// When several colors of the same family are active the greatest one wins,
/// and a search highlight always replaces the background.
pub fn resolve(tags: &BTreeSet<StyleKind>, base: &FontSpec) -> ResolvedStyle {
    let mut style = ResolvedStyle {
        family: base.family.clone(),
        size: base.size,
        bold: false,
        italic: false,
        underline: false,
        foreground: None,
        background: None,
    };
    let mut highlighted = false;

    for tag in tags {
        match tag {
            StyleKind::Bold => style.bold = true,
            StyleKind::Italic => style.italic = true,
            StyleKind::Underline => style.underline = true,
            StyleKind::TextColor(c) => style.foreground = Some(*c),
            StyleKind::Background(c) => style.background = Some(*c),
            StyleKind::SearchHighlight => highlighted = true,
        }
    }

    if highlighted {
        style.background = Some(HIGHLIGHT_BACKGROUND);
    }
    style
}

/// Resolve every run of `styles` against `base`.
pub fn styled_runs(styles: &StyleRangeSet, base: &FontSpec) -> Vec<StyledRun> {
    styles
        .runs()
        .into_iter()
        .map(|run| StyledRun {
            style: resolve(&run.tags, base),
            range: run.range,
        })
        .collect()
}

//! Character-range formatting layer.
//!
//! Styles are stored separately from the text as tagged, possibly overlapping
//! ranges of character offsets. Ranges follow the text as it is edited through
//! `on_insert` / `on_delete`.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::app::infrastructure::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const YELLOW: Color = Color::from_rgb(255, 255, 0);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Color> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::from_rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Kind of formatting carried by a range.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleKind {
    Bold,
    Italic,
    Underline,
    TextColor(Color),
    Background(Color),
    SearchHighlight,
}

impl StyleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleKind::Bold => "bold",
            StyleKind::Italic => "italic",
            StyleKind::Underline => "underline",
            StyleKind::TextColor(_) => "text-color",
            StyleKind::Background(_) => "background",
            StyleKind::SearchHighlight => "search",
        }
    }

    /// True when both kinds belong to the same family, ignoring color values.
    pub fn same_family(&self, other: &StyleKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRange {
    pub kind: StyleKind,
    pub start: usize,
    pub end: usize,
}

impl StyleRange {
    pub fn new(kind: StyleKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A maximal segment of text whose active tag set is constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRun {
    pub range: Range<usize>,
    pub tags: BTreeSet<StyleKind>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleRangeSet {
    ranges: Vec<StyleRange>,
    /// Length in characters of the text the ranges refer to.
    text_len: usize,
}

impl StyleRangeSet {
    pub fn new(text_len: usize) -> Self {
        Self {
            ranges: Vec::new(),
            text_len,
        }
    }

    pub fn text_len(&self) -> usize {
        self.text_len
    }

    pub fn ranges(&self) -> &[StyleRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Drop every range and start tracking a text of `text_len` characters.
    pub fn reset(&mut self, text_len: usize) {
        self.ranges.clear();
        self.text_len = text_len;
    }

    fn check_bounds(&self, start: usize, end: usize) -> Result<()> {
        if start >= end || end > self.text_len {
            return Err(AppError::Range {
                start,
                end,
                len: self.text_len,
            });
        }
        Ok(())
    }

    pub fn active_tags(&self, pos: usize) -> BTreeSet<StyleKind> {
        self.ranges
            .iter()
            .filter(|r| r.contains(pos))
            .map(|r| r.kind.clone())
            .collect()
    }

    /// Whether every position of `[start, end)` carries `kind`.
    pub fn is_covered(&self, kind: &StyleKind, start: usize, end: usize) -> bool {
        let mut spans: Vec<(usize, usize)> = self
            .ranges
            .iter()
            .filter(|r| r.kind == *kind && r.start < end && r.end > start)
            .map(|r| (r.start, r.end))
            .collect();
        spans.sort_unstable();

        let mut reach = start;
        for (s, e) in spans {
            if s > reach {
                break;
            }
            reach = reach.max(e);
            if reach >= end {
                return true;
            }
        }
        reach >= end
    }

    /// Remove `kind` from `[start, end)` if the whole interval carries it,
    /// otherwise add one range covering the interval.
    ///
    /// Applying the same toggle twice restores the previous coverage.
    pub fn toggle(&mut self, kind: StyleKind, start: usize, end: usize) -> Result<()> {
        self.check_bounds(start, end)?;

        if !self.is_covered(&kind, start, end) {
            self.ranges.push(StyleRange::new(kind, start, end));
            return Ok(());
        }

        // A range added by an earlier toggle over the same interval is undone on its own,
        // so partial coverage that predates it survives.
        if let Some(idx) = self
            .ranges
            .iter()
            .rposition(|r| r.kind == kind && r.start == start && r.end == end)
        {
            self.ranges.remove(idx);
            if !self.is_covered(&kind, start, end) {
                return Ok(());
            }
        }

        self.cut(start, end, |k| *k == kind);
        Ok(())
    }

    /// Unconditionally remove `kind` from `[start, end)`.
    pub fn clear(&mut self, kind: &StyleKind, start: usize, end: usize) -> Result<()> {
        self.check_bounds(start, end)?;
        self.cut(start, end, |k| k == kind);
        Ok(())
    }

    /// Remove every kind matching `pred` from `[start, end)`.
    pub fn clear_matching<F>(&mut self, start: usize, end: usize, pred: F) -> Result<()>
    where
        F: Fn(&StyleKind) -> bool,
    {
        self.check_bounds(start, end)?;
        self.cut(start, end, pred);
        Ok(())
    }

    /// Add a range without looking at existing coverage.
    pub fn insert(&mut self, kind: StyleKind, start: usize, end: usize) -> Result<()> {
        self.check_bounds(start, end)?;
        self.ranges.push(StyleRange::new(kind, start, end));
        Ok(())
    }

    /// Drop all ranges of `kind`, returning how many were removed.
    pub fn remove_kind(&mut self, kind: &StyleKind) -> usize {
        let before = self.ranges.len();
        self.ranges.retain(|r| r.kind != *kind);
        before - self.ranges.len()
    }

    fn cut<F>(&mut self, start: usize, end: usize, pred: F)
    where
        F: Fn(&StyleKind) -> bool,
    {
        let old = std::mem::take(&mut self.ranges);
        let mut kept = Vec::with_capacity(old.len());
        for r in old {
            if !pred(&r.kind) || r.end <= start || r.start >= end {
                kept.push(r);
                continue;
            }
            if r.start < start {
                kept.push(StyleRange::new(r.kind.clone(), r.start, start));
            }
            if r.end > end {
                kept.push(StyleRange::new(r.kind, end, r.end));
            }
        }
        self.ranges = kept;
    }

    /// Called after `count` characters were inserted at `pos`.
    ///
    /// Ranges starting at or after `pos` move right; ranges strictly spanning
    /// `pos` grow. A range ending exactly at `pos` is not extended.
    pub fn on_insert(&mut self, pos: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.text_len += count;
        for r in &mut self.ranges {
            if pos <= r.start {
                r.start += count;
                r.end += count;
            } else if pos < r.end {
                r.end += count;
            }
        }
    }

    /// Called after the characters in `[start, end)` were removed.
    pub fn on_delete(&mut self, start: usize, end: usize) {
        if end <= start {
            return;
        }
        let removed = end - start;
        let shift = |b: usize| {
            if b <= start {
                b
            } else if b >= end {
                b - removed
            } else {
                start
            }
        };
        for r in &mut self.ranges {
            r.start = shift(r.start);
            r.end = shift(r.end);
        }
        self.ranges.retain(|r| !r.is_empty());
        self.text_len = self.text_len.saturating_sub(removed);
    }

    /// Merged intervals carrying `kind`.
    pub fn coverage(&self, kind: &StyleKind) -> Vec<Range<usize>> {
        let mut spans: Vec<(usize, usize)> = self
            .ranges
            .iter()
            .filter(|r| r.kind == *kind)
            .map(|r| (r.start, r.end))
            .collect();
        spans.sort_unstable();

        let mut merged: Vec<Range<usize>> = Vec::new();
        for (s, e) in spans {
            match merged.last_mut() {
                Some(last) if s <= last.end => last.end = last.end.max(e),
                _ => merged.push(s..e),
            }
        }
        merged
    }

    /// Split the whole text into runs of constant formatting.
    pub fn runs(&self) -> Vec<StyleRun> {
        if self.text_len == 0 {
            return Vec::new();
        }

        let mut bounds = BTreeSet::new();
        bounds.insert(0);
        bounds.insert(self.text_len);
        for r in &self.ranges {
            bounds.insert(r.start.min(self.text_len));
            bounds.insert(r.end.min(self.text_len));
        }
        let points: Vec<usize> = bounds.into_iter().collect();

        let mut runs: Vec<StyleRun> = Vec::new();
        for w in points.windows(2) {
            let tags = self.active_tags(w[0]);
            match runs.last_mut() {
                Some(last) if last.tags == tags => last.range.end = w[1],
                _ => runs.push(StyleRun {
                    range: w[0]..w[1],
                    tags,
                }),
            }
        }
        runs
    }
}

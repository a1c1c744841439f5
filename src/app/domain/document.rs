//! Document model - the text buffer, its formatting and its file state

use std::collections::BTreeSet;
use std::ops::Range;

use ropey::Rope;

use super::styles::{StyleKind, StyleRangeSet};
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::search::find_all;
use crate::app::services::text_ops::word_count;

pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u64);

/// Represents an edit operation for undo/redo functionality
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    Insert { position: usize, text: String },
    Delete { position: usize, text: String },
    /// Whole-buffer replacement
    Replace { deleted: String, inserted: String },
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    /// Persisted filename; None until the document is first saved
    name: Option<String>,
    /// The text buffer, indexed by character
    buffer: Rope,
    styles: StyleRangeSet,
    /// Whether text or formatting changed since the last load or save
    modified: bool,
    selection: Option<Range<usize>>,
    undo_stack: Vec<EditOperation>,
    redo_stack: Vec<EditOperation>,
}

impl Document {
    pub fn new_untitled(id: DocumentId) -> Self {
        Self {
            id,
            name: None,
            buffer: Rope::new(),
            styles: StyleRangeSet::new(0),
            modified: false,
            selection: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn new_from_file(id: DocumentId, name: String, content: &str) -> Self {
        let mut doc = Self::new_untitled(id);
        doc.mark_loaded(content, name);
        doc
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| UNTITLED.to_string())
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Length in characters.
    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    pub fn is_dirty(&self) -> bool {
        self.modified
    }

    pub fn styles(&self) -> &StyleRangeSet {
        &self.styles
    }

    pub fn active_tags(&self, pos: usize) -> BTreeSet<StyleKind> {
        self.styles.active_tags(pos)
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.text())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // --- Text editing ---

    pub fn set_text(&mut self, text: &str) {
        let deleted = self.text();
        self.replace_all(text);
        self.record(EditOperation::Replace {
            deleted,
            inserted: text.to_string(),
        });
    }

    pub fn insert(&mut self, pos: usize, text: &str) -> Result<()> {
        if pos > self.len_chars() {
            return Err(AppError::Range {
                start: pos,
                end: pos,
                len: self.len_chars(),
            });
        }
        if text.is_empty() {
            return Ok(());
        }
        self.raw_insert(pos, text);
        self.record(EditOperation::Insert {
            position: pos,
            text: text.to_string(),
        });
        Ok(())
    }

    pub fn delete(&mut self, start: usize, end: usize) -> Result<()> {
        let len = self.len_chars();
        if start > end || end > len {
            return Err(AppError::Range { start, end, len });
        }
        if start == end {
            return Ok(());
        }
        let text = self.raw_delete(start, end);
        self.record(EditOperation::Delete {
            position: start,
            text,
        });
        Ok(())
    }

    /// Revert the most recent text edit. Formatting removed by the edit is not restored.
    pub fn undo(&mut self) -> bool {
        let Some(op) = self.undo_stack.pop() else {
            return false;
        };
        match &op {
            EditOperation::Insert { position, text } => {
                let end = position + text.chars().count();
                self.raw_delete(*position, end);
            }
            EditOperation::Delete { position, text } => self.raw_insert(*position, text),
            EditOperation::Replace { deleted, .. } => self.replace_all(deleted),
        }
        self.redo_stack.push(op);
        self.touch();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(op) = self.redo_stack.pop() else {
            return false;
        };
        match &op {
            EditOperation::Insert { position, text } => self.raw_insert(*position, text),
            EditOperation::Delete { position, text } => {
                let end = position + text.chars().count();
                self.raw_delete(*position, end);
            }
            EditOperation::Replace { inserted, .. } => self.replace_all(inserted),
        }
        self.undo_stack.push(op);
        self.touch();
        true
    }

    fn record(&mut self, op: EditOperation) {
        self.undo_stack.push(op);
        self.redo_stack.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.modified = true;
        self.selection = None;
    }

    fn raw_insert(&mut self, pos: usize, text: &str) {
        self.buffer.insert(pos, text);
        self.styles.on_insert(pos, text.chars().count());
    }

    fn raw_delete(&mut self, start: usize, end: usize) -> String {
        let removed = self.buffer.slice(start..end).to_string();
        self.buffer.remove(start..end);
        self.styles.on_delete(start, end);
        removed
    }

    fn replace_all(&mut self, text: &str) {
        let len = self.len_chars();
        if len > 0 {
            self.raw_delete(0, len);
        }
        self.raw_insert(0, text);
    }

    // --- Selection ---

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    pub fn select(&mut self, start: usize, end: usize) -> Result<()> {
        let len = self.len_chars();
        if start > end || end > len {
            return Err(AppError::Range { start, end, len });
        }
        self.selection = Some(start..end);
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.selection = Some(0..self.len_chars());
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // --- Formatting ---

    /// Toggle `kind` over `[start, end)`.
    pub fn apply_style(&mut self, kind: StyleKind, start: usize, end: usize) -> Result<()> {
        if start == end {
            return Err(AppError::Selection);
        }
        self.styles.toggle(kind, start, end)?;
        self.modified = true;
        Ok(())
    }

    /// Paint a color over `[start, end)`, replacing other colors of the same family there.
    pub fn paint(&mut self, kind: StyleKind, start: usize, end: usize) -> Result<()> {
        if start == end {
            return Err(AppError::Selection);
        }
        self.styles
            .clear_matching(start, end, |k| k.same_family(&kind))?;
        self.styles.insert(kind, start, end)?;
        self.modified = true;
        Ok(())
    }

    /// Replace all search highlights with the matches of `term`; returns the match count.
    ///
    /// Highlights are transient and do not mark the document as modified.
    pub fn highlight(&mut self, term: &str) -> Result<usize> {
        let matches = find_all(&self.text(), term)?;
        self.styles.remove_kind(&StyleKind::SearchHighlight);
        for m in &matches {
            self.styles
                .insert(StyleKind::SearchHighlight, m.start, m.end)?;
        }
        Ok(matches.len())
    }

    pub fn clear_highlights(&mut self) -> usize {
        self.styles.remove_kind(&StyleKind::SearchHighlight)
    }

    // --- File state ---

    pub fn mark_saved(&mut self, name: String) {
        self.name = Some(name);
        self.modified = false;
    }

    /// Replace the document with freshly loaded content. Formatting and history are discarded.
    pub fn mark_loaded(&mut self, text: &str, name: String) {
        self.buffer = Rope::from_str(text);
        self.styles.reset(self.buffer.len_chars());
        self.name = Some(name);
        self.modified = false;
        self.selection = None;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

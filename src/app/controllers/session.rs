//! Session coordinator: the open tabs, the note store and the unsaved-changes flow.
//!
//! Every destructive action (new, open another note, exit) first resolves the
//! unsaved state of *all* open tabs through [`SessionManager::confirm_discard_all`].
//! Errors from user commands are recovered in [`SessionManager::dispatch`] and
//! reported through the [`Prompter`].

use std::fmt;

use chrono::NaiveDateTime;

use crate::app::controllers::tabs::TabManager;
use crate::app::domain::document::{Document, DocumentId};
use crate::app::domain::messages::Message;
use crate::app::domain::settings::{AppSettings, MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::app::domain::styles::{Color, StyleKind};
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::note_store::{NoteStore, filename_at, generate_filename};
use crate::app::services::style_map::{FontSpec, StyledRun, styled_runs};
use crate::app::services::text_ops::extract_filename;

/// Answer to "save changes before continuing?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChoice {
    SaveAll,
    Discard,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info { title: String, message: String },
    Warning { title: String, message: String },
    Error { title: String, message: String },
}

impl Notice {
    pub fn info(title: &str, message: impl Into<String>) -> Self {
        Self::Info {
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        let message = err.to_string();
        match err {
            AppError::Validation(_) => Self::Warning {
                title: "Input Required".to_string(),
                message,
            },
            AppError::Selection => Self::Warning {
                title: "Selection Error".to_string(),
                message,
            },
            AppError::DuplicateName(_) => Self::Warning {
                title: "Duplicate Filename".to_string(),
                message,
            },
            _ => Self::Error {
                title: "Error".to_string(),
                message,
            },
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Info { title, .. } | Self::Warning { title, .. } | Self::Error { title, .. } => {
                title
            }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info { message, .. }
            | Self::Warning { message, .. }
            | Self::Error { message, .. } => message,
        }
    }
}

/// Dialogs the session needs from whatever front end drives it.
pub trait Prompter {
    /// Several tabs have unsaved changes; `names` are their display names.
    fn confirm_unsaved(&mut self, names: &[String]) -> UnsavedChoice;
    /// A single tab with unsaved changes is about to close.
    fn confirm_close(&mut self, name: &str) -> UnsavedChoice;
    /// Title for a note that has never been saved. `None` when the user cancels.
    fn ask_title(&mut self) -> Option<String>;
    fn notify(&mut self, notice: Notice);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub document: DocumentId,
    pub name: String,
    pub words: usize,
    pub dirty: bool,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File: {} | Words: {}", self.name, self.words)
    }
}

/// Notified after every text or style mutation and every tab change.
pub trait SessionObserver {
    fn status_changed(&mut self, status: &StatusLine);
}

pub struct SessionManager {
    settings: AppSettings,
    store: NoteStore,
    tabs: TabManager,
    /// Font for the current session, starts from the settings
    font: FontSpec,
    observers: Vec<Box<dyn SessionObserver>>,
    clock: Option<fn() -> NaiveDateTime>,
    closed: bool,
}

impl SessionManager {
    /// Start a session with one empty Untitled tab.
    pub fn new(settings: AppSettings) -> Self {
        let store = NoteStore::new(settings.notes_directory.clone());
        if let Err(e) = store.ensure_directory() {
            tracing::error!(dir = %store.dir().display(), "Could not create notes directory: {}", e);
        }

        let mut tabs = TabManager::new();
        tabs.add_untitled();

        Self {
            font: settings.font(),
            settings,
            store,
            tabs,
            observers: Vec::new(),
            clock: None,
            closed: false,
        }
    }

    /// Use a fixed time source for generated filenames.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    pub fn active(&self) -> Option<&Document> {
        self.tabs.active_doc()
    }

    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn status_line(&self) -> Option<StatusLine> {
        self.tabs.active_doc().map(|doc| StatusLine {
            document: doc.id,
            name: doc.display_name(),
            words: doc.word_count(),
            dirty: doc.is_dirty(),
        })
    }

    fn notify_observers(&mut self) {
        if let Some(status) = self.status_line() {
            for observer in &mut self.observers {
                observer.status_changed(&status);
            }
        }
    }

    fn require_active(&self) -> Result<DocumentId> {
        self.tabs
            .active_id()
            .ok_or_else(|| AppError::validation("No document is open."))
    }

    fn doc(&self, id: DocumentId) -> Result<&Document> {
        self.tabs
            .doc_by_id(id)
            .ok_or_else(|| AppError::validation("That document is no longer open."))
    }

    fn doc_mut(&mut self, id: DocumentId) -> Result<&mut Document> {
        self.tabs
            .doc_by_id_mut(id)
            .ok_or_else(|| AppError::validation("That document is no longer open."))
    }

    fn active_mut(&mut self) -> Result<&mut Document> {
        let id = self.require_active()?;
        self.doc_mut(id)
    }

    fn filename_for(&self, title: &str) -> String {
        match self.clock {
            Some(now) => filename_at(title, &now()),
            None => generate_filename(title),
        }
    }

    // --- Unsaved state ---

    /// Resolve unsaved changes in every tab before a destructive action.
    ///
    /// Saving is best effort: failures are reported but still proceed.
    pub fn confirm_discard_all(&mut self, prompter: &mut dyn Prompter) -> Decision {
        let dirty = self.tabs.dirty_ids();
        if dirty.is_empty() {
            return Decision::Proceed;
        }

        let names: Vec<String> = dirty
            .iter()
            .filter_map(|id| self.tabs.doc_by_id(*id))
            .map(|d| d.display_name())
            .collect();

        match prompter.confirm_unsaved(&names) {
            UnsavedChoice::SaveAll => {
                for id in dirty {
                    if let Err(e) = self.save(id, prompter) {
                        tracing::warn!(?id, "Save before continuing failed: {}", e);
                        prompter.notify(Notice::from_error(&e));
                    }
                }
                Decision::Proceed
            }
            UnsavedChoice::Discard => {
                tracing::info!(count = names.len(), "discarding unsaved changes");
                Decision::Proceed
            }
            UnsavedChoice::Cancel => Decision::Cancel,
        }
    }

    // --- File operations ---

    pub fn new_document(&mut self, prompter: &mut dyn Prompter) -> Option<DocumentId> {
        if self.confirm_discard_all(prompter) == Decision::Cancel {
            return None;
        }
        let id = self.tabs.add_untitled();
        self.notify_observers();
        Some(id)
    }

    /// Activate the tab showing `filename`, or load it into a new tab.
    pub fn open_or_focus(&mut self, filename: &str) -> Result<DocumentId> {
        if let Some(id) = self.tabs.find_by_name(filename) {
            self.tabs.set_active(id);
            self.notify_observers();
            return Ok(id);
        }

        let name = self.store.resolve(filename)?;
        let content = self.store.load(&name)?;
        let id = self.tabs.add_from_file(name.clone(), &content);
        tracing::info!(file = %name, "opened note");
        self.notify_observers();
        Ok(id)
    }

    /// Open a note by path. Only the filename is used; notes live in the notes directory.
    ///
    /// Opening a note that is already open just focuses it; otherwise unsaved
    /// changes are resolved first. Returns `None` when the user cancels.
    pub fn open(&mut self, path: &str, prompter: &mut dyn Prompter) -> Result<Option<DocumentId>> {
        let filename = extract_filename(path);
        if self.tabs.find_by_name(&filename).is_some() {
            return self.open_or_focus(&filename).map(Some);
        }
        if self.confirm_discard_all(prompter) == Decision::Cancel {
            return Ok(None);
        }
        self.open_or_focus(&filename).map(Some)
    }

    /// Save a document under its name, asking for a title when it has none.
    pub fn save(&mut self, id: DocumentId, prompter: &mut dyn Prompter) -> Result<String> {
        let doc = self.doc(id)?;
        let text = doc.text();
        ensure_content(&text)?;

        let Some(name) = doc.name().map(str::to_string) else {
            let title = prompter.ask_title().unwrap_or_default();
            return self.save_as(id, &title);
        };

        self.store.save(&name, &text)?;
        self.doc_mut(id)?.mark_saved(name.clone());
        tracing::info!(file = %name, "saved note");
        self.notify_observers();
        Ok(name)
    }

    /// Save a document under a new timestamped name derived from `title`.
    ///
    /// On any failure the document keeps its previous name and stays dirty.
    pub fn save_as(&mut self, id: DocumentId, title: &str) -> Result<String> {
        let text = self.doc(id)?.text();
        ensure_content(&text)?;
        if title.trim().is_empty() {
            return Err(AppError::validation("Note title cannot be empty."));
        }

        let filename = self.filename_for(title);
        let open_elsewhere = self
            .tabs
            .find_by_name(&filename)
            .is_some_and(|other| other != id);
        if open_elsewhere || self.store.exists(&filename)? {
            return Err(AppError::DuplicateName(filename));
        }

        self.store.save(&filename, &text)?;
        self.doc_mut(id)?.mark_saved(filename.clone());
        tracing::info!(file = %filename, "saved note under new name");
        self.notify_observers();
        Ok(filename)
    }

    pub fn list_notes(&self) -> Result<Vec<String>> {
        self.store.list()
    }

    /// Close one tab, asking about its unsaved changes. The session always keeps one tab.
    pub fn close_tab(&mut self, id: DocumentId, prompter: &mut dyn Prompter) -> Decision {
        let Some(doc) = self.tabs.doc_by_id(id) else {
            return Decision::Cancel;
        };

        if doc.is_dirty() {
            match prompter.confirm_close(&doc.display_name()) {
                UnsavedChoice::SaveAll => {
                    if let Err(e) = self.save(id, prompter) {
                        prompter.notify(Notice::from_error(&e));
                        return Decision::Cancel;
                    }
                }
                UnsavedChoice::Discard => {}
                UnsavedChoice::Cancel => return Decision::Cancel,
            }
        }

        self.tabs.remove(id);
        if self.tabs.count() == 0 {
            self.tabs.add_untitled();
        }
        self.notify_observers();
        Decision::Proceed
    }

    /// Resolve unsaved changes, then tear the session down.
    pub fn close_session(&mut self, prompter: &mut dyn Prompter) -> Decision {
        let decision = self.confirm_discard_all(prompter);
        if decision == Decision::Proceed {
            self.tabs.clear();
            self.closed = true;
            tracing::info!("session closed");
        }
        decision
    }

    // --- Tabs ---

    pub fn switch_to(&mut self, id: DocumentId) -> bool {
        let switched = self.tabs.set_active(id);
        if switched {
            self.notify_observers();
        }
        switched
    }

    pub fn next_tab(&mut self) -> bool {
        match self.tabs.next_doc_id() {
            Some(id) => self.switch_to(id),
            None => false,
        }
    }

    pub fn prev_tab(&mut self) -> bool {
        match self.tabs.prev_doc_id() {
            Some(id) => self.switch_to(id),
            None => false,
        }
    }

    // --- Editing the active document ---

    pub fn insert_text(&mut self, pos: usize, text: &str) -> Result<()> {
        self.active_mut()?.insert(pos, text)?;
        self.notify_observers();
        Ok(())
    }

    pub fn append_text(&mut self, text: &str) -> Result<()> {
        let doc = self.active_mut()?;
        let end = doc.len_chars();
        doc.insert(end, text)?;
        self.notify_observers();
        Ok(())
    }

    pub fn delete_text(&mut self, start: usize, end: usize) -> Result<()> {
        self.active_mut()?.delete(start, end)?;
        self.notify_observers();
        Ok(())
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.active_mut()?.set_text(text);
        self.notify_observers();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool> {
        let undone = self.active_mut()?.undo();
        if undone {
            self.notify_observers();
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let redone = self.active_mut()?.redo();
        if redone {
            self.notify_observers();
        }
        Ok(redone)
    }

    pub fn select(&mut self, start: usize, end: usize) -> Result<()> {
        self.active_mut()?.select(start, end)
    }

    pub fn select_all(&mut self) -> Result<()> {
        self.active_mut()?.select_all();
        Ok(())
    }

    fn selected_range(&self) -> Result<(DocumentId, usize, usize)> {
        let id = self.require_active()?;
        let sel = self.doc(id)?.selection().ok_or(AppError::Selection)?;
        Ok((id, sel.start, sel.end))
    }

    /// Toggle a style over the active selection.
    pub fn toggle_style(&mut self, kind: StyleKind) -> Result<()> {
        let (id, start, end) = self.selected_range()?;
        self.doc_mut(id)?.apply_style(kind, start, end)?;
        self.notify_observers();
        Ok(())
    }

    pub fn set_text_color(&mut self, color: Color) -> Result<()> {
        let (id, start, end) = self.selected_range()?;
        self.doc_mut(id)?
            .paint(StyleKind::TextColor(color), start, end)?;
        self.notify_observers();
        Ok(())
    }

    pub fn set_background(&mut self, color: Color) -> Result<()> {
        let (id, start, end) = self.selected_range()?;
        self.doc_mut(id)?
            .paint(StyleKind::Background(color), start, end)?;
        self.notify_observers();
        Ok(())
    }

    /// Highlight every match of `term` in the active document; returns the match count.
    pub fn search(&mut self, term: &str) -> Result<usize> {
        let count = self.active_mut()?.highlight(term)?;
        tracing::debug!(term, count, "search");
        self.notify_observers();
        Ok(count)
    }

    pub fn clear_search(&mut self) -> Result<()> {
        self.active_mut()?.clear_highlights();
        self.notify_observers();
        Ok(())
    }

    // --- Font ---

    pub fn set_font_family(&mut self, family: &str) -> Result<()> {
        if family.trim().is_empty() {
            return Err(AppError::validation("Font family cannot be empty."));
        }
        self.font.family = family.trim().to_string();
        Ok(())
    }

    pub fn set_font_size(&mut self, size: u32) -> Result<()> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
            return Err(AppError::validation(format!(
                "Font size must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}."
            )));
        }
        self.font.size = size;
        Ok(())
    }

    /// Runs of the document with their effective attributes under the session font.
    pub fn styled_runs(&self, id: DocumentId) -> Option<Vec<StyledRun>> {
        self.tabs
            .doc_by_id(id)
            .map(|doc| styled_runs(doc.styles(), &self.font))
    }

    // --- Command dispatch ---

    /// Run one user command. Errors become notifications; returns true when the
    /// application should exit.
    pub fn dispatch(&mut self, message: Message, prompter: &mut dyn Prompter) -> bool {
        tracing::debug!(?message, "dispatch");
        match self.handle(message, prompter) {
            Ok(exit) => exit,
            Err(e) => {
                if e.is_user_error() {
                    tracing::warn!("{}", e);
                } else {
                    tracing::error!("{}", e);
                }
                prompter.notify(Notice::from_error(&e));
                false
            }
        }
    }

    fn handle(&mut self, message: Message, prompter: &mut dyn Prompter) -> Result<bool> {
        match message {
            Message::FileNew => {
                self.new_document(prompter);
            }
            Message::FileOpen(path) => {
                self.open(&path, prompter)?;
            }
            Message::FileSave => {
                let id = self.require_active()?;
                let name = self.save(id, prompter)?;
                prompter.notify(Notice::info("Saved", format!("File '{name}' saved successfully.")));
            }
            Message::FileSaveAs(title) => {
                let id = self.require_active()?;
                let name = self.save_as(id, &title)?;
                prompter.notify(Notice::info("Saved", format!("File '{name}' saved successfully.")));
            }
            Message::FileQuit => return Ok(self.close_session(prompter) == Decision::Proceed),
            Message::ListNotes => {
                let names = self.list_notes()?;
                let message = if names.is_empty() {
                    "No notes yet.".to_string()
                } else {
                    names.join("\n")
                };
                prompter.notify(Notice::info("Notes", message));
            }
            Message::CloseTab => {
                let id = self.require_active()?;
                self.close_tab(id, prompter);
            }
            Message::SwitchTab(id) => {
                self.switch_to(id);
            }
            Message::NextTab => {
                self.next_tab();
            }
            Message::PrevTab => {
                self.prev_tab();
            }
            Message::Insert { pos, text } => self.insert_text(pos, &text)?,
            Message::Append(text) => self.append_text(&text)?,
            Message::Delete { start, end } => self.delete_text(start, end)?,
            Message::Select { start, end } => self.select(start, end)?,
            Message::SelectAll => self.select_all()?,
            Message::EditUndo => {
                self.undo()?;
            }
            Message::EditRedo => {
                self.redo()?;
            }
            Message::Search(term) => {
                if self.search(&term)? == 0 {
                    prompter.notify(Notice::info("Search", format!("No matches found for '{term}'.")));
                }
            }
            Message::ClearSearch => self.clear_search()?,
            Message::ToggleStyle(kind) => self.toggle_style(kind)?,
            Message::SetTextColor(color) => self.set_text_color(color)?,
            Message::SetBackground(color) => self.set_background(color)?,
            Message::SetFontFamily(family) => self.set_font_family(&family)?,
            Message::SetFontSize(size) => self.set_font_size(size)?,
        }
        Ok(false)
    }
}

fn ensure_content(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(AppError::validation("Cannot save an empty note."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct ScriptedPrompter {
        choices: VecDeque<UnsavedChoice>,
        titles: VecDeque<Option<String>>,
        prompts: Vec<Vec<String>>,
        notices: Vec<Notice>,
    }

    impl ScriptedPrompter {
        fn choosing(choice: UnsavedChoice) -> Self {
            Self {
                choices: VecDeque::from([choice]),
                ..Default::default()
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm_unsaved(&mut self, names: &[String]) -> UnsavedChoice {
            self.prompts.push(names.to_vec());
            self.choices.pop_front().unwrap_or(UnsavedChoice::Cancel)
        }

        fn confirm_close(&mut self, name: &str) -> UnsavedChoice {
            self.prompts.push(vec![name.to_string()]);
            self.choices.pop_front().unwrap_or(UnsavedChoice::Cancel)
        }

        fn ask_title(&mut self) -> Option<String> {
            self.titles.pop_front().flatten()
        }

        fn notify(&mut self, notice: Notice) {
            self.notices.push(notice);
        }
    }

    struct Recorder(Rc<RefCell<Vec<StatusLine>>>);

    impl SessionObserver for Recorder {
        fn status_changed(&mut self, status: &StatusLine) {
            self.0.borrow_mut().push(status.clone());
        }
    }

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn session() -> (TempDir, SessionManager) {
        let tmp = TempDir::new().unwrap();
        let settings = AppSettings::with_notes_directory(tmp.path().join("Notes"));
        let session = SessionManager::new(settings).with_clock(fixed_now);
        (tmp, session)
    }

    fn active_id(session: &SessionManager) -> DocumentId {
        session.tabs().active_id().unwrap()
    }

    #[test]
    fn test_starts_with_one_clean_untitled_tab() {
        let (_tmp, session) = session();
        assert_eq!(session.tabs().count(), 1);
        let doc = session.active().unwrap();
        assert_eq!(doc.name(), None);
        assert_eq!(doc.text(), "");
        assert!(!doc.is_dirty());
        assert!(session.store().dir().is_dir());
    }

    #[test]
    fn test_new_without_dirty_tabs_does_not_prompt() {
        let (_tmp, mut session) = session();
        let mut prompter = ScriptedPrompter::default();
        let id = session.new_document(&mut prompter).unwrap();
        assert_eq!(session.tabs().count(), 2);
        assert_eq!(active_id(&session), id);
        assert!(prompter.prompts.is_empty());
    }

    #[test]
    fn test_discard_writes_nothing() {
        let (_tmp, mut session) = session();
        session.set_text("first draft").unwrap();
        let first = session.save_as(active_id(&session), "first").unwrap();
        session.set_text("first draft, edited").unwrap();

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::Discard);
        session.new_document(&mut prompter).unwrap();
        session.set_text("second").unwrap();

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::Discard);
        assert_eq!(session.confirm_discard_all(&mut prompter), Decision::Proceed);
        assert_eq!(prompter.prompts, vec![vec![first.clone(), "Untitled".to_string()]]);

        assert_eq!(session.store().load(&first).unwrap(), "first draft");
        assert_eq!(session.list_notes().unwrap(), vec![first]);
        assert_eq!(session.tabs().dirty_ids().len(), 2);
    }

    #[test]
    fn test_save_all_saves_every_dirty_tab() {
        let (_tmp, mut session) = session();
        session.set_text("named note").unwrap();
        let named = session.save_as(active_id(&session), "named").unwrap();
        session.set_text("named note v2").unwrap();

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::Discard);
        session.new_document(&mut prompter).unwrap();
        session.set_text("brand new").unwrap();

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::SaveAll);
        prompter.titles.push_back(Some("fresh".to_string()));
        assert_eq!(session.confirm_discard_all(&mut prompter), Decision::Proceed);

        assert!(session.tabs().dirty_ids().is_empty());
        assert_eq!(session.store().load(&named).unwrap(), "named note v2");
        assert_eq!(
            session.store().load("20240501_093000_fresh.txt").unwrap(),
            "brand new"
        );
        assert!(prompter.notices.is_empty());
    }

    #[test]
    fn test_save_all_is_best_effort() {
        let (_tmp, mut session) = session();
        session.set_text("needs a title").unwrap();

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::SaveAll);
        prompter.titles.push_back(None);
        assert_eq!(session.confirm_discard_all(&mut prompter), Decision::Proceed);

        let doc = session.active().unwrap();
        assert!(doc.is_dirty());
        assert_eq!(doc.name(), None);
        assert!(matches!(prompter.notices.as_slice(), [Notice::Warning { .. }]));
    }

    #[test]
    fn test_cancel_keeps_everything() {
        let (_tmp, mut session) = session();
        session.set_text("unsaved").unwrap();
        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::Cancel);
        assert_eq!(session.new_document(&mut prompter), None);
        assert_eq!(session.tabs().count(), 1);

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::Cancel);
        assert_eq!(session.close_session(&mut prompter), Decision::Cancel);
        assert!(!session.is_closed());
        assert_eq!(session.tabs().count(), 1);
    }

    #[test]
    fn test_close_session_without_changes() {
        let (_tmp, mut session) = session();
        let mut prompter = ScriptedPrompter::default();
        assert_eq!(session.close_session(&mut prompter), Decision::Proceed);
        assert!(session.is_closed());
        assert_eq!(session.tabs().count(), 0);
        assert!(prompter.prompts.is_empty());
    }

    #[test]
    fn test_open_or_focus_does_not_reload() {
        let (_tmp, mut session) = session();
        session.store().save("Todo.txt", "on disk").unwrap();

        let id = session.open_or_focus("todo.TXT").unwrap();
        assert_eq!(session.active().unwrap().name(), Some("Todo.txt"));
        session.append_text(" + local edit").unwrap();

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::Discard);
        session.new_document(&mut prompter).unwrap();
        assert_eq!(session.tabs().count(), 3);

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::Cancel);
        assert_eq!(session.open("/elsewhere/TODO.txt", &mut prompter).unwrap(), Some(id));

        assert_eq!(active_id(&session), id);
        assert_eq!(session.active().unwrap().text(), "on disk + local edit");
        assert_eq!(session.tabs().count(), 3);
        assert!(prompter.prompts.is_empty());
    }

    #[test]
    fn test_failed_open_leaves_session_unchanged() {
        let (_tmp, mut session) = session();
        let mut prompter = ScriptedPrompter::default();
        assert!(matches!(
            session.open("missing.txt", &mut prompter),
            Err(AppError::Io(_))
        ));
        assert_eq!(session.tabs().count(), 1);
    }

    #[test]
    fn test_saved_file_has_no_style_markers() {
        let (_tmp, mut session) = session();
        session.set_text("hello world hello").unwrap();
        session.select(0, 5).unwrap();
        session.toggle_style(StyleKind::Bold).unwrap();
        session.search("hello").unwrap();

        let name = session.save_as(active_id(&session), "greeting").unwrap();
        assert_eq!(name, "20240501_093000_greeting.txt");
        assert_eq!(
            fs::read_to_string(session.store().dir().join(&name)).unwrap(),
            "hello world hello"
        );

        let doc = session.active().unwrap();
        assert!(!doc.is_dirty());
        assert!(doc.active_tags(2).contains(&StyleKind::Bold));
    }

    #[test]
    fn test_save_keeps_name_stable() {
        let (_tmp, mut session) = session();
        session.set_text("v1").unwrap();
        let id = active_id(&session);
        let name = session.save_as(id, "stable").unwrap();

        session.set_text("v2").unwrap();
        let mut prompter = ScriptedPrompter::default();
        assert_eq!(session.save(id, &mut prompter).unwrap(), name);
        assert_eq!(session.store().load(&name).unwrap(), "v2");
        assert_eq!(session.list_notes().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let (_tmp, mut session) = session();
        session.store().save("20240501_093000_Plan.txt", "existing").unwrap();
        session.set_text("new plan").unwrap();

        let id = active_id(&session);
        assert!(matches!(
            session.save_as(id, "plan"),
            Err(AppError::DuplicateName(_))
        ));
        let doc = session.active().unwrap();
        assert!(doc.is_dirty());
        assert_eq!(doc.name(), None);
        assert_eq!(session.store().load("20240501_093000_Plan.txt").unwrap(), "existing");
    }

    #[test]
    fn test_duplicate_of_open_tab_is_rejected() {
        let (_tmp, mut session) = session();
        session.set_text("one").unwrap();
        let name = session.save_as(active_id(&session), "same").unwrap();
        fs::remove_file(session.store().dir().join(&name)).unwrap();

        let mut prompter = ScriptedPrompter::default();
        let other = session.new_document(&mut prompter).unwrap();
        session.set_text("two").unwrap();
        assert!(matches!(
            session.save_as(other, "same"),
            Err(AppError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_save_validation() {
        let (_tmp, mut session) = session();
        let id = active_id(&session);
        let mut prompter = ScriptedPrompter::default();
        assert!(matches!(session.save(id, &mut prompter), Err(AppError::Validation(_))));

        session.set_text("   \n").unwrap();
        assert!(matches!(session.save_as(id, "blank"), Err(AppError::Validation(_))));

        session.set_text("content").unwrap();
        assert!(matches!(session.save_as(id, "  "), Err(AppError::Validation(_))));
        assert!(session.list_notes().unwrap().is_empty());
    }

    #[test]
    fn test_failed_save_stays_dirty() {
        let (tmp, mut session) = session();
        session.set_text("keep me").unwrap();
        let id = active_id(&session);
        let name = session.save_as(id, "kept").unwrap();
        session.set_text("keep me too").unwrap();

        fs::remove_dir_all(tmp.path().join("Notes")).unwrap();
        let mut prompter = ScriptedPrompter::default();
        assert!(matches!(session.save(id, &mut prompter), Err(AppError::Io(_))));

        let doc = session.active().unwrap();
        assert!(doc.is_dirty());
        assert_eq!(doc.name(), Some(name.as_str()));
    }

    #[test]
    fn test_close_tab() {
        let (_tmp, mut session) = session();
        session.set_text("scratch").unwrap();
        let id = active_id(&session);

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::Cancel);
        assert_eq!(session.close_tab(id, &mut prompter), Decision::Cancel);
        assert_eq!(active_id(&session), id);

        let mut prompter = ScriptedPrompter::choosing(UnsavedChoice::Discard);
        assert_eq!(session.close_tab(id, &mut prompter), Decision::Proceed);
        assert_eq!(session.tabs().count(), 1);
        assert_ne!(active_id(&session), id);
        assert_eq!(session.active().unwrap().text(), "");
    }

    #[test]
    fn test_style_commands_need_selection() {
        let (_tmp, mut session) = session();
        session.set_text("some text").unwrap();
        assert!(matches!(
            session.toggle_style(StyleKind::Italic),
            Err(AppError::Selection)
        ));

        session.select_all().unwrap();
        let red = Color::from_rgb(255, 0, 0);
        session.set_text_color(red).unwrap();
        session.select(0, 4).unwrap();
        session.set_background(Color::from_rgb(0, 0, 0)).unwrap();

        let doc = session.active().unwrap();
        let tags = doc.active_tags(1);
        assert!(tags.contains(&StyleKind::TextColor(red)));
        assert!(tags.contains(&StyleKind::Background(Color::from_rgb(0, 0, 0))));
        assert!(!doc.active_tags(6).contains(&StyleKind::Background(Color::from_rgb(0, 0, 0))));
    }

    #[test]
    fn test_dispatch_reports_errors() {
        let (_tmp, mut session) = session();
        let mut prompter = ScriptedPrompter::default();

        assert!(!session.dispatch(Message::Search(String::new()), &mut prompter));
        assert!(!session.dispatch(Message::ToggleStyle(StyleKind::Bold), &mut prompter));
        assert!(!session.dispatch(Message::FileOpen("nope.txt".into()), &mut prompter));

        let titles: Vec<&str> = prompter.notices.iter().map(|n| n.title()).collect();
        assert_eq!(titles, vec!["Input Required", "Selection Error", "Error"]);
        assert!(matches!(prompter.notices[2], Notice::Error { .. }));
    }

    #[test]
    fn test_dispatch_search_reports_no_matches() {
        let (_tmp, mut session) = session();
        let mut prompter = ScriptedPrompter::default();
        session.dispatch(Message::Append("alpha beta".into()), &mut prompter);
        session.dispatch(Message::Search("gamma".into()), &mut prompter);
        assert_eq!(prompter.notices[0].message(), "No matches found for 'gamma'.");

        session.dispatch(Message::Search("BETA".into()), &mut prompter);
        assert_eq!(prompter.notices.len(), 1);
    }

    #[test]
    fn test_dispatch_save_flow_and_quit() {
        let (_tmp, mut session) = session();
        let mut prompter = ScriptedPrompter::default();
        prompter.titles.push_back(Some("Journal".into()));

        session.dispatch(Message::Append("dear diary".into()), &mut prompter);
        assert!(!session.dispatch(Message::FileSave, &mut prompter));
        assert_eq!(
            prompter.notices.last().unwrap().message(),
            "File '20240501_093000_Journal.txt' saved successfully."
        );

        assert!(session.dispatch(Message::FileQuit, &mut prompter));
        assert!(session.is_closed());
    }

    #[test]
    fn test_observers_see_status_updates() {
        let (_tmp, mut session) = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        session.subscribe(Box::new(Recorder(seen.clone())));

        session.append_text("one two").unwrap();
        session.append_text(" three").unwrap();
        session.select(0, 3).unwrap();
        session.toggle_style(StyleKind::Underline).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].words, 3);
        assert!(seen[2].dirty);
        assert_eq!(seen[2].to_string(), "File: Untitled | Words: 3");
    }

    #[test]
    fn test_font_changes_flow_into_runs() {
        let (_tmp, mut session) = session();
        session.set_text("abcdef").unwrap();
        session.select(0, 2).unwrap();
        session.toggle_style(StyleKind::Bold).unwrap();

        assert!(session.set_font_size(4).is_err());
        assert!(session.set_font_family(" ").is_err());
        session.set_font_size(20).unwrap();
        session.set_font_family("Courier").unwrap();

        let runs = session.styled_runs(active_id(&session)).unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].style.bold);
        assert_eq!(runs[0].style.size, 20);
        assert_eq!(runs[1].style.family, "Courier");
        assert_eq!(session.settings().font_size, 12);
    }

    #[test]
    fn test_tab_cycling() {
        let (_tmp, mut session) = session();
        let first = active_id(&session);
        let mut prompter = ScriptedPrompter::default();
        let second = session.new_document(&mut prompter).unwrap();

        assert!(session.next_tab());
        assert_eq!(active_id(&session), first);
        assert!(session.prev_tab());
        assert_eq!(active_id(&session), second);
        assert!(!session.switch_to(DocumentId(999)));
    }
}

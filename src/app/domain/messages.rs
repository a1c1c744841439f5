use super::document::DocumentId;
use super::styles::{Color, StyleKind};

/// All user commands the session understands.
/// Front ends translate their input into one of these; `SessionManager::dispatch` handles them.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // File
    FileNew,
    FileOpen(String),
    FileSave,
    FileSaveAs(String),
    FileQuit,
    ListNotes,

    // Tabs
    CloseTab,
    SwitchTab(DocumentId),
    NextTab,
    PrevTab,

    // Edit
    Insert { pos: usize, text: String },
    Append(String),
    Delete { start: usize, end: usize },
    Select { start: usize, end: usize },
    SelectAll,
    EditUndo,
    EditRedo,
    Search(String),
    ClearSearch,

    // Format
    ToggleStyle(StyleKind),
    SetTextColor(Color),
    SetBackground(Color),
    SetFontFamily(String),
    SetFontSize(u32),
}

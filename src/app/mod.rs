//! Application layer.
//!
//! # Structure
//!
//! - `domain/` - Core data structures (Document, styles, Settings, Messages)
//! - `controllers/` - Orchestration (TabManager, SessionManager)
//! - `services/` - Operations on text and files (note store, search, style resolution)
//! - `infrastructure/` - Error type and logging setup

pub mod controllers;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use controllers::session::{
    Decision, Notice, Prompter, SessionManager, SessionObserver, StatusLine, UnsavedChoice,
};
pub use controllers::tabs::TabManager;
pub use domain::{AppSettings, Color, Document, DocumentId, Message, StyleKind, StyleRangeSet};
pub use infrastructure::error::{AppError, Result};
pub use services::note_store::NoteStore;

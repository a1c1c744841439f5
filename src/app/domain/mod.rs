//! Domain layer - core data structures and types.
//!
//! This module contains the fundamental domain models:
//! - Document and DocumentId
//! - Style ranges over a document's text
//! - Application settings
//! - Message types for the command dispatcher

pub mod document;
pub mod messages;
pub mod settings;
pub mod styles;

pub use document::{Document, DocumentId};
pub use messages::Message;
pub use settings::AppSettings;
pub use styles::{Color, StyleKind, StyleRange, StyleRangeSet};

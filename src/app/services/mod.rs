//! Services layer - operations on text and files.
//!
//! - Note persistence
//! - Search
//! - Style resolution for rendering
//! - Text helpers

pub mod note_store;
pub mod search;
pub mod style_map;
pub mod text_ops;

//! Controllers layer - orchestration and coordination.
//!
//! - Tab management
//! - The editing session and its unsaved-changes flow

pub mod session;
pub mod tabs;

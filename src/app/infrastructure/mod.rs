//! Infrastructure layer - error types and logging.

pub mod error;
pub mod logging;

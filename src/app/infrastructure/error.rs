use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Rejected user input: empty note, empty title, empty search term.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid range {start}..{end} for text of length {len}")]
    Range { start: usize, end: usize, len: usize },

    #[error("Please select text first.")]
    Selection,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("A file named '{0}' already exists. Please choose a different title.")]
    DuplicateName(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Errors caused by what the user asked for, as opposed to the environment failing.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Selection | Self::DuplicateName(_)
        )
    }
}

/// Convenience type alias for Results with AppError
pub type Result<T> = std::result::Result<T, AppError>;

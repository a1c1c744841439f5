//! Plain-text note files in one flat directory.
//!
//! Notes are stored as raw UTF-8 `.txt` files named
//! `YYYYMMDD_HHMMSS_<sanitized title>.txt`. Name lookups are case-insensitive
//! regardless of the underlying filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::app::infrastructure::error::{AppError, Result};

pub const NOTE_EXTENSION: &str = ".txt";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Case-insensitive filename comparison used for every uniqueness check.
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Replace every character outside `[A-Za-z0-9-_.() ]` with `_`.
pub fn sanitize(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Filename for a note titled `title` saved at `at`.
pub fn filename_at(title: &str, at: &NaiveDateTime) -> String {
    format!("{}_{}{}", at.format(TIMESTAMP_FORMAT), sanitize(title), NOTE_EXTENSION)
}

/// Filename for a note titled `title` saved now. Two calls within the same
/// second for the same title produce the same name.
pub fn generate_filename(title: &str) -> String {
    filename_at(title, &Local::now().naive_local())
}

#[derive(Debug, Clone)]
pub struct NoteStore {
    dir: PathBuf,
}

impl NoteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the notes directory if it does not exist yet.
    pub fn ensure_directory(&self) -> Result<()> {
        if self.dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;
        tracing::info!(dir = %self.dir.display(), "created notes directory");
        Ok(())
    }

    /// Note filenames in directory enumeration order.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.to_lowercase().ends_with(NOTE_EXTENSION) {
                names.push(name);
            }
        }
        Ok(names)
    }

    pub fn exists(&self, filename: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|n| names_match(n, filename)))
    }

    /// The on-disk spelling of `filename`, matched case-insensitively.
    pub fn resolve(&self, filename: &str) -> Result<String> {
        self.list()?
            .into_iter()
            .find(|n| names_match(n, filename))
            .ok_or_else(|| {
                AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("note '{filename}' not found"),
                ))
            })
    }

    /// Write `content` verbatim, replacing any previous version of the note.
    ///
    /// The text goes to a temporary file first and is renamed into place, so a
    /// failed save never leaves a truncated note behind.
    pub fn save(&self, filename: &str, content: &str) -> Result<()> {
        let path = self.note_path(filename)?;
        let tmp = self.dir.join(format!(".{filename}.tmp"));

        if let Err(e) = fs::write(&tmp, content) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!(file = filename, bytes = content.len(), "note written");
        Ok(())
    }

    pub fn load(&self, filename: &str) -> Result<String> {
        let path = self.note_path(filename)?;
        let content = fs::read_to_string(&path)?;
        tracing::debug!(file = filename, bytes = content.len(), "note read");
        Ok(content)
    }

    fn note_path(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty()
            || filename == "."
            || filename == ".."
            || filename.contains(['/', '\\'])
        {
            return Err(AppError::validation(format!(
                "'{filename}' is not a valid note name."
            )));
        }
        Ok(self.dir.join(filename))
    }
}

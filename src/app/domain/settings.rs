use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::style_map::FontSpec;

/// Application configuration. Read once at startup and handed to the session
/// by value; nothing mutates it while the session runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_notes_directory")]
    pub notes_directory: PathBuf,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Also write logs to a daily file under the data directory
    #[serde(default = "default_log_to_file")]
    pub log_to_file: bool,
}

fn default_notes_directory() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("quillpad");
    path.push("Notes");
    path
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    12
}

fn default_log_to_file() -> bool {
    true
}

pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 72;

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            notes_directory: default_notes_directory(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            log_to_file: default_log_to_file(),
        }
    }
}

impl AppSettings {
    /// Settings rooted at a specific notes directory, everything else default.
    pub fn with_notes_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_directory: dir.into(),
            ..Default::default()
        }
    }

    pub fn font(&self) -> FontSpec {
        FontSpec::new(self.font_family.clone(), self.font_size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.font_family.trim().is_empty() {
            return Err(AppError::Settings("font family cannot be empty".to_string()));
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(AppError::Settings(format!(
                "font size {} is outside {}..={}",
                self.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE
            )));
        }
        Ok(())
    }

    /// Load settings from disk, or create default if not exists
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        match fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Failed to parse settings: {}. Using defaults.", e);
                    Self::default()
                }
            },
            Err(_) => {
                // File doesn't exist, use defaults
                let default = Self::default();
                // Try to save defaults for next time
                if let Err(e) = default.save() {
                    tracing::debug!("Could not write default settings: {}", e);
                }
                default
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, json)?;

        Ok(())
    }

    /// Get config file path (cross-platform)
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("quillpad");
        path.push("settings.json");
        path
    }
}

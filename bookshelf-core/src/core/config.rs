//! Application configuration for Bookshelf.
//!
//! Stores where the databases live and how long idle view-state subscriptions
//! are kept, in a JSON file at an OS-appropriate location.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Directory holding both databases.
    pub data_dir: PathBuf,
    /// File name of the book database inside `data_dir`.
    pub database_file: String,
    /// File name of the preferences database inside `data_dir`.
    pub preferences_file: String,
    /// Grace period before an unobserved book list subscription is dropped.
    pub state_grace_millis: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: "books.db".to_string(),
            preferences_file: "user_prefs.db".to_string(),
            state_grace_millis: 5_000,
        }
    }
}

impl AppConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(&self.preferences_file)
    }

    pub fn state_grace_period(&self) -> Duration {
        Duration::from_millis(self.state_grace_millis)
    }
}

/// Returns the path to the config JSON file.
///
/// - macOS / Linux: `~/.config/bookshelf/config.json`
/// - Windows: `%APPDATA%/Bookshelf/config.json`
pub fn config_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("Bookshelf").join("config.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("bookshelf").join("config.json")
    }
}

/// Returns the default data directory, e.g. `~/.local/share/bookshelf`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join("bookshelf")
}

/// Loads the config from `path`; returns defaults if the file is missing or corrupt.
pub fn load_config(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring corrupt config {}: {e}", path.display());
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Saves the config to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`crate::BookshelfError::Io`] if the directory or file cannot be
/// written, or [`crate::BookshelfError::Json`] if serialization fails.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            state_grace_millis: 250,
            ..AppConfig::in_dir(dir.path())
        };

        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"databaseFile":"library.db"}"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.database_file, "library.db");
        assert_eq!(config.preferences_file, "user_prefs.db");
        assert_eq!(config.state_grace_period(), Duration::from_secs(5));
    }

    #[test]
    fn test_paths_are_inside_data_dir() {
        let config = AppConfig::in_dir("/tmp/shelf");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/shelf/books.db"));
        assert_eq!(
            config.preferences_path(),
            PathBuf::from("/tmp/shelf/user_prefs.db")
        );
    }
}

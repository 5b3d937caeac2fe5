//! Error types for the Bookshelf core library.

use thiserror::Error;

/// All errors that can occur within the Bookshelf core library.
#[derive(Debug, Error)]
pub enum BookshelfError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record with this ID is already stored; inserts never overwrite.
    #[error("Book already exists: {0}")]
    Conflict(String),

    /// The opened file is not a usable Bookshelf database.
    #[error("Invalid database: {0}")]
    InvalidDatabase(String),

    /// A blocking store task panicked or was cancelled before it finished.
    #[error("Background task failed: {0}")]
    Task(String),

    /// An operation that needs a tokio runtime was called outside of one.
    #[error("No async runtime available: {0}")]
    Runtime(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file could not be serialized or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`BookshelfError`].
pub type Result<T> = std::result::Result<T, BookshelfError>;

impl BookshelfError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(_) => "Could not save your changes".to_string(),
            Self::Conflict(_) => "This book already exists".to_string(),
            Self::InvalidDatabase(_) => "Could not open the book database".to_string(),
            Self::Task(_) | Self::Runtime(_) => "Could not complete the operation".to_string(),
            Self::Io(_) => "Could not access the data folder".to_string(),
            Self::Json(_) => "Could not read the settings file".to_string(),
        }
    }

    /// Returns `true` when the error is an insert that hit an existing ID.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

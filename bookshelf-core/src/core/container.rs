//! Composition root: builds every store exactly once and hands out shared handles.

use crate::{
    AppConfig, BookStore, BooksRepository, BooksViewModel, PrefsStore, Result, Session,
    SqliteBooksRepository, Storage,
};
use std::fs;
use std::sync::Arc;

/// Owns the process-lifetime stores of the application.
///
/// Construct one at startup and pass it (or the handles it returns) to the
/// screens that need them.
pub struct AppContainer {
    config: AppConfig,
    books: Arc<dyn BooksRepository>,
    preferences: Arc<PrefsStore>,
    session: Session,
}

impl AppContainer {
    /// Creates the data directory if needed and opens both databases.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Io`] if the data directory cannot be
    /// created, [`crate::BookshelfError::InvalidDatabase`] if the book
    /// database has an unexpected layout, or
    /// [`crate::BookshelfError::Database`] for any SQLite failure.
    pub fn open(config: AppConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let storage = Storage::open_or_create(config.database_path())?;
        let store = Arc::new(BookStore::new(storage));
        let preferences = Arc::new(PrefsStore::open(config.preferences_path())?);
        log::info!("opened bookshelf data in {}", config.data_dir.display());

        Ok(Self {
            config,
            books: Arc::new(SqliteBooksRepository::new(store)),
            preferences,
            session: Session::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn books(&self) -> Arc<dyn BooksRepository> {
        Arc::clone(&self.books)
    }

    pub fn preferences(&self) -> Arc<PrefsStore> {
        Arc::clone(&self.preferences)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Builds a view model over the shared repository.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Runtime`] when called outside a tokio runtime.
    pub fn books_view_model(&self) -> Result<BooksViewModel> {
        BooksViewModel::with_grace_period(self.books(), self.config.state_grace_period())
    }

    /// Copies the persisted nickname into the session, as done at startup.
    pub fn restore_session(&self) {
        let saved = self.preferences.user_name().borrow().clone();
        self.session.set_user_name(saved);
    }

    /// Signs in with `name` and remembers it for the next start.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Database`] if the nickname cannot be
    /// persisted; the session is still updated in that case.
    pub async fn sign_in(&self, name: &str) -> Result<()> {
        self.session.set_user_name(name);
        self.preferences.set_user_name(name).await
    }

    /// Clears the in-memory session. The persisted nickname is kept.
    pub fn sign_out(&self) {
        self.session.reset_for_logout();
    }
}

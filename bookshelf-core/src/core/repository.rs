//! The book repository: the only component that mutates the record store.
//!
//! It assigns IDs and timestamps and maps store records to domain [`Book`]s.
//! Queries are passed through to the store's live queries unchanged.

use crate::core::blocking::run_blocking;
use crate::{normalize_synopsis, Book, BookRecord, BookStore, LiveQuery, NewBook, Result};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Source of "now" for `created_at`/`updated_at`, in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time from [`chrono::Utc`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// The seam the presentation layer talks to.
///
/// Operations on an ID that does not exist succeed without doing anything.
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// All books, most recently updated first.
    fn observe_all(&self) -> LiveQuery<Vec<Book>>;

    /// Favorite books, most recently updated first.
    fn observe_favorites(&self) -> LiveQuery<Vec<Book>>;

    /// The book with `id`, or `None` once it is deleted.
    fn observe_by_id(&self, id: &str) -> LiveQuery<Option<Book>>;

    /// Stores a new book and returns its freshly generated ID.
    async fn add_book(&self, new_book: NewBook) -> Result<String>;

    /// Replaces title, page count and synopsis and refreshes `updated_at`.
    async fn update_book(
        &self,
        id: &str,
        title: String,
        num_page: u32,
        synopsis: Option<String>,
    ) -> Result<()>;

    /// Flips the favorite flag without touching `updated_at`.
    async fn toggle_favorite(&self, id: &str) -> Result<()>;

    async fn delete_book(&self, id: &str) -> Result<()>;
}

/// [`BooksRepository`] over a SQLite [`BookStore`].
///
/// Store calls run on tokio's blocking pool, so every mutation suspends the
/// caller until the write has committed.
pub struct SqliteBooksRepository {
    store: Arc<BookStore>,
    clock: Arc<dyn Clock>,
}

impl SqliteBooksRepository {
    pub fn new(store: Arc<BookStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<BookStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the underlying record store.
    pub fn store(&self) -> &Arc<BookStore> {
        &self.store
    }
}

fn to_books(records: Vec<BookRecord>) -> Vec<Book> {
    records.into_iter().map(Book::from).collect()
}

#[async_trait]
impl BooksRepository for SqliteBooksRepository {
    fn observe_all(&self) -> LiveQuery<Vec<Book>> {
        self.store.get_all().map(to_books)
    }

    fn observe_favorites(&self) -> LiveQuery<Vec<Book>> {
        self.store.get_favorites().map(to_books)
    }

    fn observe_by_id(&self, id: &str) -> LiveQuery<Option<Book>> {
        self.store.get_by_id(id).map(|record| record.map(Book::from))
    }

    async fn add_book(&self, new_book: NewBook) -> Result<String> {
        let now = self.clock.now_millis();
        let record = BookRecord {
            id: Uuid::new_v4().to_string(),
            title: new_book.title,
            author: new_book.author,
            num_page: new_book.num_page,
            synopsis: normalize_synopsis(new_book.synopsis),
            created_at: now,
            updated_at: now,
            is_favorite: new_book.is_favorite,
        };
        let id = record.id.clone();

        let store = Arc::clone(&self.store);
        run_blocking(move || store.insert(&record)).await?;

        log::info!("added book {id}");
        Ok(id)
    }

    async fn update_book(
        &self,
        id: &str,
        title: String,
        num_page: u32,
        synopsis: Option<String>,
    ) -> Result<()> {
        let now = self.clock.now_millis();
        let store = Arc::clone(&self.store);
        let id = id.to_string();

        run_blocking(move || {
            let synopsis = normalize_synopsis(synopsis);
            store
                .edit(&id, &title, num_page, synopsis.as_deref(), now)
                .map(|_| ())
        })
        .await
    }

    async fn toggle_favorite(&self, id: &str) -> Result<()> {
        let store = Arc::clone(&self.store);
        let id = id.to_string();
        run_blocking(move || store.toggle_favorite(&id).map(|_| ())).await
    }

    async fn delete_book(&self, id: &str) -> Result<()> {
        let store = Arc::clone(&self.store);
        let owned_id = id.to_string();
        if run_blocking(move || store.delete_by_id(&owned_id)).await? {
            log::info!("deleted book {id}");
        }
        Ok(())
    }
}

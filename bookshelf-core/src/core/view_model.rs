use crate::core::shared_state::DEFAULT_GRACE_PERIOD;
use crate::{Book, BooksRepository, LiveQuery, NewBook, Result, SharedState, StateObserver};
use std::sync::Arc;
use std::time::Duration;

/// Presentation-facing adapter over a [`BooksRepository`].
///
/// Exposes the book list as a [`SharedState`] (empty until the first query
/// result) and reports mutations as plain success flags. Failures are
/// logged here and never raised to the screen.
pub struct BooksViewModel {
    repository: Arc<dyn BooksRepository>,
    books: SharedState<Vec<Book>>,
}

impl BooksViewModel {
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Runtime`] when called outside a tokio runtime.
    pub fn new(repository: Arc<dyn BooksRepository>) -> Result<Self> {
        Self::with_grace_period(repository, DEFAULT_GRACE_PERIOD)
    }

    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Runtime`] when called outside a tokio runtime.
    pub fn with_grace_period(
        repository: Arc<dyn BooksRepository>,
        grace: Duration,
    ) -> Result<Self> {
        let source = Arc::clone(&repository);
        let books = SharedState::new(Vec::new(), grace, move || source.observe_all())?;
        Ok(Self { repository, books })
    }

    /// Starts (or joins) the shared subscription to all books.
    pub fn books(&self) -> StateObserver<Vec<Book>> {
        self.books.subscribe()
    }

    /// The last published book list, without subscribing.
    pub fn current_books(&self) -> Vec<Book> {
        self.books.value()
    }

    pub fn observe_book(&self, id: &str) -> LiveQuery<Option<Book>> {
        self.repository.observe_by_id(id)
    }

    pub async fn add_book(&self, new_book: NewBook) -> bool {
        report("add book", self.repository.add_book(new_book).await)
    }

    pub async fn update_book(
        &self,
        id: &str,
        title: String,
        num_page: u32,
        synopsis: Option<String>,
    ) -> bool {
        report(
            "update book",
            self.repository
                .update_book(id, title, num_page, synopsis)
                .await,
        )
    }

    pub async fn toggle_favorite(&self, id: &str) -> bool {
        report("toggle favorite", self.repository.toggle_favorite(id).await)
    }

    pub async fn delete_book(&self, id: &str) -> bool {
        report("delete book", self.repository.delete_book(id).await)
    }
}

fn report<T>(action: &str, result: Result<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            log::warn!("{action} failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BookStore, BookshelfError, SqliteBooksRepository, Storage};
    use async_trait::async_trait;
    use tokio::time::timeout;

    /// A repository whose writes always fail with a conflict.
    struct FailingRepository(SqliteBooksRepository);

    #[async_trait]
    impl BooksRepository for FailingRepository {
        fn observe_all(&self) -> LiveQuery<Vec<Book>> {
            self.0.observe_all()
        }
        fn observe_favorites(&self) -> LiveQuery<Vec<Book>> {
            self.0.observe_favorites()
        }
        fn observe_by_id(&self, id: &str) -> LiveQuery<Option<Book>> {
            self.0.observe_by_id(id)
        }
        async fn add_book(&self, _new_book: NewBook) -> Result<String> {
            Err(BookshelfError::Conflict("fixed".to_string()))
        }
        async fn update_book(&self, id: &str, _: String, _: u32, _: Option<String>) -> Result<()> {
            Err(BookshelfError::Conflict(id.to_string()))
        }
        async fn toggle_favorite(&self, id: &str) -> Result<()> {
            Err(BookshelfError::Conflict(id.to_string()))
        }
        async fn delete_book(&self, id: &str) -> Result<()> {
            Err(BookshelfError::Conflict(id.to_string()))
        }
    }

    fn sqlite_repository() -> SqliteBooksRepository {
        SqliteBooksRepository::new(Arc::new(BookStore::new(Storage::open_in_memory().unwrap())))
    }

    #[tokio::test]
    async fn test_successful_operations_report_true() {
        let vm = BooksViewModel::new(Arc::new(sqlite_repository())).unwrap();
        let mut books = vm.books();

        assert!(vm.add_book(NewBook::new("Dune", "Frank Herbert")).await);

        let list = loop {
            let list = timeout(Duration::from_secs(5), books.changed())
                .await
                .unwrap()
                .unwrap();
            if !list.is_empty() {
                break list;
            }
        };
        let id = list[0].id.clone();

        assert!(vm.toggle_favorite(&id).await);
        assert!(vm.update_book(&id, "Dune II".to_string(), 10, None).await);
        assert!(vm.delete_book(&id).await);
        // Missing IDs are not failures.
        assert!(vm.delete_book(&id).await);
    }

    #[tokio::test]
    async fn test_failures_report_false() {
        let vm = BooksViewModel::new(Arc::new(FailingRepository(sqlite_repository()))).unwrap();

        assert!(!vm.add_book(NewBook::new("Dune", "Frank Herbert")).await);
        assert!(!vm.update_book("x", "t".to_string(), 0, None).await);
        assert!(!vm.toggle_favorite("x").await);
        assert!(!vm.delete_book("x").await);
    }

    #[tokio::test]
    async fn test_current_books_starts_empty() {
        let vm = BooksViewModel::new(Arc::new(sqlite_repository())).unwrap();
        assert!(vm.current_books().is_empty());
    }

    #[tokio::test]
    async fn test_observe_book_passes_through() {
        let repo = Arc::new(sqlite_repository());
        let id = repo.add_book(NewBook::new("Dune", "Frank Herbert")).await.unwrap();
        let vm = BooksViewModel::new(repo).unwrap();

        let book = vm.observe_book(&id).current().await.unwrap();
        assert_eq!(book.map(|b| b.title), Some("Dune".to_string()));
    }
}

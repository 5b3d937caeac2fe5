//! SQLite-backed record store for books.

use crate::{BookRecord, BookshelfError, LiveQuery, Result, Storage};
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

const SELECT_BOOKS: &str =
    "SELECT id, title, author, num_page, synopsis, created_at, updated_at, is_favorite FROM books";

/// Durable keyed storage of [`BookRecord`]s.
///
/// The connection is serialised behind a mutex, so the store is the single
/// writer for its database. Every mutation that changes at least one row
/// bumps a change counter after the statement commits; [`LiveQuery`]s
/// created by [`get_all`](Self::get_all) and friends re-run on each bump.
pub struct BookStore {
    storage: Mutex<Storage>,
    changes: watch::Sender<u64>,
}

impl BookStore {
    pub fn new(storage: Storage) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            storage: Mutex::new(storage),
            changes,
        }
    }

    /// Live list of all books, most recently updated first.
    pub fn get_all(self: &Arc<Self>) -> LiveQuery<Vec<BookRecord>> {
        let store = Arc::clone(self);
        LiveQuery::new(self.changes.subscribe(), move || store.list_all())
    }

    /// Live list of favorite books, most recently updated first.
    pub fn get_favorites(self: &Arc<Self>) -> LiveQuery<Vec<BookRecord>> {
        let store = Arc::clone(self);
        LiveQuery::new(self.changes.subscribe(), move || store.list_favorites())
    }

    /// Live view of the book with `id`, `None` while it does not exist.
    pub fn get_by_id(self: &Arc<Self>, id: &str) -> LiveQuery<Option<BookRecord>> {
        let store = Arc::clone(self);
        let id = id.to_string();
        LiveQuery::new(self.changes.subscribe(), move || store.find_by_id(&id))
    }

    /// Returns all books ordered by `updated_at` descending.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Database`] for any SQLite failure.
    pub fn list_all(&self) -> Result<Vec<BookRecord>> {
        self.query_books(&format!(
            "{SELECT_BOOKS} ORDER BY updated_at DESC, rowid DESC"
        ))
    }

    /// Returns favorite books ordered by `updated_at` descending.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Database`] for any SQLite failure.
    pub fn list_favorites(&self) -> Result<Vec<BookRecord>> {
        self.query_books(&format!(
            "{SELECT_BOOKS} WHERE is_favorite = 1 ORDER BY updated_at DESC, rowid DESC"
        ))
    }

    /// Fetches a single book by ID.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Database`] for any SQLite failure other than
    /// "no rows returned".
    pub fn find_by_id(&self, id: &str) -> Result<Option<BookRecord>> {
        let storage = self.lock();
        let record = storage
            .connection()
            .query_row(
                &format!("{SELECT_BOOKS} WHERE id = ? LIMIT 1"),
                [id],
                map_book_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Returns the number of stored books.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Database`] for any SQLite failure.
    pub fn count(&self) -> Result<usize> {
        let storage = self.lock();
        let count: i64 =
            storage
                .connection()
                .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Inserts a new record. Never overwrites.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Conflict`] if a record with the same ID
    /// already exists, or [`BookshelfError::Database`] for any other SQLite failure.
    pub fn insert(&self, record: &BookRecord) -> Result<()> {
        let storage = self.lock();
        let result = storage.connection().execute(
            "INSERT INTO books
                 (id, title, author, num_page, synopsis, created_at, updated_at, is_favorite)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                record.id,
                record.title,
                record.author,
                record.num_page,
                record.synopsis,
                record.created_at,
                record.updated_at,
                record.is_favorite,
            ],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                log::warn!("insert rejected, book {} already exists", record.id);
                return Err(BookshelfError::Conflict(record.id.clone()));
            }
            Err(e) => return Err(e.into()),
        }
        drop(storage);

        self.notify();
        Ok(())
    }

    /// Replaces every column of the record with the same ID.
    ///
    /// Returns `false` (and notifies nobody) when no such record exists.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Database`] for any SQLite failure.
    pub fn update(&self, record: &BookRecord) -> Result<bool> {
        let changed = self.lock().connection().execute(
            "UPDATE books SET title = ?1, author = ?2, num_page = ?3, synopsis = ?4,
                              created_at = ?5, updated_at = ?6, is_favorite = ?7
             WHERE id = ?8",
            rusqlite::params![
                record.title,
                record.author,
                record.num_page,
                record.synopsis,
                record.created_at,
                record.updated_at,
                record.is_favorite,
                record.id,
            ],
        )?;
        Ok(self.notify_if_changed(changed, "update", &record.id))
    }

    /// Rewrites the editable fields of `id` in one statement.
    ///
    /// `author`, `created_at` and `is_favorite` are left untouched, so a
    /// concurrent [`toggle_favorite`](Self::toggle_favorite) is never lost.
    /// `updated_at` becomes `now`, clamped to be no earlier than `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Database`] for any SQLite failure.
    pub fn edit(
        &self,
        id: &str,
        title: &str,
        num_page: u32,
        synopsis: Option<&str>,
        now: i64,
    ) -> Result<bool> {
        let changed = self.lock().connection().execute(
            "UPDATE books SET title = ?1, num_page = ?2, synopsis = ?3,
                              updated_at = MAX(?4, created_at)
             WHERE id = ?5",
            rusqlite::params![title, num_page, synopsis, now, id],
        )?;
        Ok(self.notify_if_changed(changed, "edit", id))
    }

    /// Removes the record with `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Database`] for any SQLite failure.
    pub fn delete_by_id(&self, id: &str) -> Result<bool> {
        let changed = self
            .lock()
            .connection()
            .execute("DELETE FROM books WHERE id = ?", [id])?;
        Ok(self.notify_if_changed(changed, "delete", id))
    }

    /// Flips `is_favorite` in a single statement. `updated_at` is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`BookshelfError::Database`] for any SQLite failure.
    pub fn toggle_favorite(&self, id: &str) -> Result<bool> {
        let changed = self.lock().connection().execute(
            "UPDATE books SET is_favorite = NOT is_favorite WHERE id = ?",
            [id],
        )?;
        Ok(self.notify_if_changed(changed, "toggle_favorite", id))
    }

    fn query_books(&self, sql: &str) -> Result<Vec<BookRecord>> {
        let storage = self.lock();
        let mut stmt = storage.connection().prepare(sql)?;
        let records = stmt
            .query_map([], map_book_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn lock(&self) -> MutexGuard<'_, Storage> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }

    fn notify_if_changed(&self, changed: usize, operation: &str, id: &str) -> bool {
        if changed == 0 {
            log::debug!("{operation} skipped, book {id} does not exist");
            return false;
        }
        self.notify();
        true
    }
}

fn map_book_row(row: &rusqlite::Row) -> rusqlite::Result<BookRecord> {
    Ok(BookRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        num_page: row.get(3)?,
        synopsis: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        is_favorite: row.get::<_, i64>(7)? != 0,
    })
}

//! Core library for Bookshelf, a local-first personal book and notes collection.
//!
//! The primary entry point is [`AppContainer`], which opens the book database and
//! the preferences database once and hands them out to the presentation layer.
//! All book mutations go through a [`BooksRepository`].
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    book::{Book, BookRecord, NewBook},
    book_store::BookStore,
    config::{config_file_path, default_data_dir, load_config, save_config, AppConfig},
    container::AppContainer,
    error::{BookshelfError, Result},
    listing::arrange_books,
    live_query::LiveQuery,
    mapper::normalize_synopsis,
    preferences::{PrefsStore, SortBy, ThemeMode},
    repository::{BooksRepository, Clock, SqliteBooksRepository, SystemClock},
    session::Session,
    shared_state::{SharedState, StateObserver},
    storage::Storage,
    view_model::BooksViewModel,
};

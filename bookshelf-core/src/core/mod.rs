//! Internal domain modules for the Bookshelf core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod book;
pub mod book_store;
pub mod config;
pub mod container;
pub mod error;
pub mod listing;
pub mod live_query;
pub mod mapper;
pub mod preferences;
pub mod repository;
pub mod session;
pub mod shared_state;
pub mod storage;
pub mod view_model;

pub(crate) mod blocking;

#[doc(inline)]
pub use book::{Book, BookRecord, NewBook};
#[doc(inline)]
pub use book_store::BookStore;
#[doc(inline)]
pub use config::{config_file_path, default_data_dir, load_config, save_config, AppConfig};
#[doc(inline)]
pub use container::AppContainer;
#[doc(inline)]
pub use error::{BookshelfError, Result};
#[doc(inline)]
pub use listing::arrange_books;
#[doc(inline)]
pub use live_query::LiveQuery;
#[doc(inline)]
pub use preferences::{PrefsStore, SortBy, ThemeMode};
#[doc(inline)]
pub use repository::{BooksRepository, Clock, SqliteBooksRepository, SystemClock};
#[doc(inline)]
pub use session::Session;
#[doc(inline)]
pub use shared_state::{SharedState, StateObserver};
#[doc(inline)]
pub use storage::Storage;
#[doc(inline)]
pub use view_model::BooksViewModel;

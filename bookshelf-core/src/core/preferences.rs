//! User preferences persistence for Bookshelf.
//!
//! Stores four independent settings (nickname, theme mode, welcome flag and
//! list sort order) as string values in a small SQLite key/value table. Each
//! key is written on its own and published on its own `watch` channel, so
//! observers of one key never see writes to another.
//!
//! Enum values are stored by name (`"DARK"`, `"TITLE"`). Values that do not
//! name a known variant, e.g. written by a newer version, read as the default.

use crate::core::blocking::run_blocking;
use crate::Result;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

const KEY_USER_NAME: &str = "user_name";
const KEY_THEME_MODE: &str = "theme_mode";
const KEY_WELCOME_SHOWN: &str = "welcome_show";
const KEY_SORT_BY: &str = "sort_by";

const PREFERENCES_DDL: &str = "CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

/// Light/dark appearance chosen by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::System];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "LIGHT",
            Self::Dark => "DARK",
            Self::System => "SYSTEM",
        }
    }

    /// Parses a stored value, falling back to [`ThemeMode::System`].
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|mode| Some(mode.as_str()) == value)
            .unwrap_or_default()
    }

    /// Whether the dark palette should be used, given the platform setting.
    #[must_use]
    pub fn is_dark(self, system_is_dark: bool) -> bool {
        match self {
            Self::Light => false,
            Self::Dark => true,
            Self::System => system_is_dark,
        }
    }
}

/// Ordering of the book list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortBy {
    /// Most recently updated first.
    #[default]
    Date,
    /// Case-insensitive title, A to Z.
    Title,
    /// Favorites first, then most recently updated.
    Favorite,
}

impl SortBy {
    pub const ALL: [Self; 3] = [Self::Date, Self::Title, Self::Favorite];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "DATE",
            Self::Title => "TITLE",
            Self::Favorite => "FAVORITE",
        }
    }

    /// Parses a stored value, falling back to [`SortBy::Date`].
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|sort| Some(sort.as_str()) == value)
            .unwrap_or_default()
    }
}

fn parse_bool_or_default(value: Option<&str>) -> bool {
    matches!(value, Some("true"))
}

/// Durable, observable user settings.
pub struct PrefsStore {
    conn: Mutex<Connection>,
    user_name: watch::Sender<String>,
    theme_mode: watch::Sender<ThemeMode>,
    welcome_shown: watch::Sender<bool>,
    sort_by: watch::Sender<SortBy>,
}

impl PrefsStore {
    /// Opens (or creates) the preferences database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Database`] if the file cannot be opened
    /// or the table cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a preferences store that lives only as long as the process.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Database`] for any SQLite failure.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(PREFERENCES_DDL, [])?;

        let user_name = read_value(&conn, KEY_USER_NAME)?.unwrap_or_default();
        let theme_mode =
            ThemeMode::parse_or_default(read_value(&conn, KEY_THEME_MODE)?.as_deref());
        let welcome_shown =
            parse_bool_or_default(read_value(&conn, KEY_WELCOME_SHOWN)?.as_deref());
        let sort_by = SortBy::parse_or_default(read_value(&conn, KEY_SORT_BY)?.as_deref());

        Ok(Self {
            conn: Mutex::new(conn),
            user_name: watch::channel(user_name).0,
            theme_mode: watch::channel(theme_mode).0,
            welcome_shown: watch::channel(welcome_shown).0,
            sort_by: watch::channel(sort_by).0,
        })
    }

    /// Observes the saved nickname (empty when unset).
    pub fn user_name(&self) -> watch::Receiver<String> {
        self.user_name.subscribe()
    }

    /// Observes the theme mode ([`ThemeMode::System`] when unset).
    pub fn theme_mode(&self) -> watch::Receiver<ThemeMode> {
        self.theme_mode.subscribe()
    }

    /// Observes whether the welcome dialog was dismissed.
    pub fn welcome_shown(&self) -> watch::Receiver<bool> {
        self.welcome_shown.subscribe()
    }

    /// Observes the list sort order ([`SortBy::Date`] when unset).
    pub fn sort_by(&self) -> watch::Receiver<SortBy> {
        self.sort_by.subscribe()
    }

    /// Persists the nickname.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Database`] if the write fails; the
    /// published value is left unchanged in that case.
    pub async fn set_user_name(self: &Arc<Self>, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.write(KEY_USER_NAME, name.clone(), move |prefs| {
            prefs.user_name.send_replace(name);
        })
        .await
    }

    /// Persists the theme mode.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Database`] if the write fails.
    pub async fn set_theme_mode(self: &Arc<Self>, mode: ThemeMode) -> Result<()> {
        self.write(KEY_THEME_MODE, mode.as_str().to_string(), move |prefs| {
            prefs.theme_mode.send_replace(mode);
        })
        .await
    }

    /// Persists the welcome flag. Passing `false` shows the dialog again on next start.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Database`] if the write fails.
    pub async fn set_welcome_shown(self: &Arc<Self>, shown: bool) -> Result<()> {
        self.write(KEY_WELCOME_SHOWN, shown.to_string(), move |prefs| {
            prefs.welcome_shown.send_replace(shown);
        })
        .await
    }

    /// Persists the list sort order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookshelfError::Database`] if the write fails.
    pub async fn set_sort_by(self: &Arc<Self>, sort_by: SortBy) -> Result<()> {
        self.write(KEY_SORT_BY, sort_by.as_str().to_string(), move |prefs| {
            prefs.sort_by.send_replace(sort_by);
        })
        .await
    }

    /// Upserts `key` and, while still holding the connection, runs `publish`.
    ///
    /// Publishing under the lock keeps the observed order of values equal to
    /// the order of the writes.
    async fn write<F>(self: &Arc<Self>, key: &'static str, value: String, publish: F) -> Result<()>
    where
        F: FnOnce(&Self) + Send + 'static,
    {
        let store = Arc::clone(self);
        run_blocking(move || {
            let conn = store.conn.lock().unwrap_or_else(PoisonError::into_inner);
            conn.execute(
                "INSERT INTO preferences (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                [key, value.as_str()],
            )?;
            publish(store.as_ref());
            Ok(())
        })
        .await?;
        log::debug!("preference {key} saved");
        Ok(())
    }
}

/// Reads the stored text for `key`. Missing rows and non-text values are `None`.
fn read_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM preferences WHERE key = ?", [key], |row| {
            Ok(row.get_ref(0)?.as_str().ok().map(str::to_owned))
        })
        .optional()?;
    Ok(value.flatten())
}

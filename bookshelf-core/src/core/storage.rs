use crate::{BookshelfError, Result};
use rusqlite::Connection;
use std::path::Path;

const INDEX_DDL: &str = "CREATE INDEX IF NOT EXISTS idx_books_updated_at ON books(updated_at);
     CREATE INDEX IF NOT EXISTS idx_books_is_favorite ON books(is_favorite);";

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Validate database structure
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = 'books'",
            [],
            |row| row.get(0),
        )?;

        if table_count != 1 {
            return Err(BookshelfError::InvalidDatabase(
                "Not a valid Bookshelf database".to_string(),
            ));
        }

        // Migrate: databases from before synopses were supported lack the column
        let column_exists: bool = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info('books') WHERE name='synopsis'",
            [],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )?;

        if !column_exists {
            log::info!("migrating books table: adding synopsis column");
            conn.execute("ALTER TABLE books ADD COLUMN synopsis TEXT", [])?;
        }
        conn.execute_batch(INDEX_DDL)?;

        Ok(Self { conn })
    }

    /// Opens `path`, initialising the schema when the file is new or empty.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_new = match std::fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if is_new {
            log::debug!("creating book database at {}", path.display());
            Self::create(path)
        } else {
            Self::open(path)
        }
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn table_names(storage: &Storage) -> Vec<String> {
        storage
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_create_storage() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::create(temp.path()).unwrap();

        assert!(table_names(&storage).contains(&"books".to_string()));

        let indices: Vec<String> = storage
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='books'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert!(indices.contains(&"idx_books_updated_at".to_string()));
        assert!(indices.contains(&"idx_books_is_favorite".to_string()));
    }

    #[test]
    fn test_open_existing_storage() {
        let temp = NamedTempFile::new().unwrap();
        Storage::create(temp.path()).unwrap();

        let storage = Storage::open(temp.path()).unwrap();
        assert!(table_names(&storage).contains(&"books".to_string()));
    }

    #[test]
    fn test_open_invalid_database() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "not a database").unwrap();

        let result = Storage::open(temp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_open_database_without_books_table() {
        let temp = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute("CREATE TABLE unrelated (id INTEGER PRIMARY KEY)", [])
                .unwrap();
        }

        let result = Storage::open(temp.path());
        assert!(matches!(result, Err(BookshelfError::InvalidDatabase(_))));
    }

    #[test]
    fn test_open_or_create_initialises_empty_file() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::open_or_create(temp.path()).unwrap();
        assert!(table_names(&storage).contains(&"books".to_string()));
    }

    #[test]
    fn test_migration_adds_synopsis_column() {
        let temp = NamedTempFile::new().unwrap();

        // Create database with the schema that predates synopses
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute(
                "CREATE TABLE books (
                    id TEXT PRIMARY KEY NOT NULL,
                    title TEXT NOT NULL,
                    author TEXT NOT NULL,
                    num_page INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    is_favorite INTEGER NOT NULL
                )",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO books VALUES ('old', 'Old Book', 'Someone', 10, 1, 1, 0)",
                [],
            )
            .unwrap();
        }

        let storage = Storage::open(temp.path()).unwrap();

        let synopsis: Option<String> = storage
            .connection()
            .query_row("SELECT synopsis FROM books WHERE id = 'old'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(synopsis.is_none(), "existing rows should get a NULL synopsis");
    }
}

//! Conversions between the stored [`BookRecord`] and the domain [`Book`].
//!
//! The only normalization is the synopsis: the column is nullable, the domain
//! field is not. A blank synopsis is stored as `NULL` and read back as `""`.

use crate::{Book, BookRecord};

/// Collapses a blank (empty or whitespace-only) synopsis to `None`.
#[must_use]
pub fn normalize_synopsis(synopsis: Option<String>) -> Option<String> {
    synopsis.filter(|s| !s.trim().is_empty())
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            author: record.author,
            num_page: record.num_page,
            synopsis: record.synopsis.unwrap_or_default(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            is_favorite: record.is_favorite,
        }
    }
}

impl From<Book> for BookRecord {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            num_page: book.num_page,
            synopsis: normalize_synopsis(Some(book.synopsis)),
            created_at: book.created_at,
            updated_at: book.updated_at,
            is_favorite: book.is_favorite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(synopsis: &str) -> Book {
        Book {
            id: "b-1".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            num_page: 412,
            synopsis: synopsis.to_string(),
            created_at: 10,
            updated_at: 20,
            is_favorite: true,
        }
    }

    #[test]
    fn test_missing_synopsis_reads_as_empty() {
        let record = BookRecord {
            synopsis: None,
            ..BookRecord::from(book("x"))
        };
        assert_eq!(Book::from(record).synopsis, "");
    }

    #[test]
    fn test_blank_synopsis_is_stored_as_null() {
        assert_eq!(BookRecord::from(book("")).synopsis, None);
        assert_eq!(BookRecord::from(book("  \n")).synopsis, None);
    }

    #[test]
    fn test_round_trip_keeps_non_blank_synopsis() {
        let original = book("A desert planet");
        let back = Book::from(BookRecord::from(original.clone()));
        assert_eq!(back, original);
    }

    #[test]
    fn test_round_trip_turns_blank_synopsis_into_empty() {
        let back = Book::from(BookRecord::from(book("   ")));
        assert_eq!(back.synopsis, "");
        assert_eq!(back.title, "Dune");
    }

    #[test]
    fn test_normalize_synopsis() {
        assert_eq!(normalize_synopsis(None), None);
        assert_eq!(normalize_synopsis(Some("\t".to_string())), None);
        assert_eq!(
            normalize_synopsis(Some(" kept ".to_string())),
            Some(" kept ".to_string())
        );
    }
}

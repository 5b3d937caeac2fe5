use crate::{Book, SortBy};
use std::cmp::Reverse;

/// Derives the list shown on the home and favorites screens.
///
/// Pure function of its inputs; sorting is stable, so books that compare
/// equal keep their snapshot order.
pub fn arrange_books(books: &[Book], favorites_only: bool, sort_by: SortBy) -> Vec<Book> {
    let mut arranged: Vec<Book> = books
        .iter()
        .filter(|book| !favorites_only || book.is_favorite)
        .cloned()
        .collect();

    match sort_by {
        SortBy::Date => arranged.sort_by_key(|book| Reverse(book.updated_at)),
        SortBy::Title => arranged.sort_by_cached_key(|book| book.title.to_lowercase()),
        SortBy::Favorite => {
            arranged.sort_by_key(|book| (Reverse(book.is_favorite), Reverse(book.updated_at)));
        }
    }
    arranged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, updated_at: i64, is_favorite: bool) -> Book {
        Book {
            id: title.to_lowercase(),
            title: title.to_string(),
            author: String::new(),
            num_page: 0,
            synopsis: String::new(),
            created_at: 0,
            updated_at,
            is_favorite,
        }
    }

    fn sample(apple_favorite: bool) -> Vec<Book> {
        vec![
            book("Banana", 10, false),
            book("Apple", 30, apple_favorite),
            book("Cherry", 20, false),
        ]
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn test_date_sorts_newest_first() {
        let arranged = arrange_books(&sample(false), false, SortBy::Date);
        let stamps: Vec<i64> = arranged.iter().map(|b| b.updated_at).collect();
        assert_eq!(stamps, vec![30, 20, 10]);
    }

    #[test]
    fn test_title_sorts_alphabetically() {
        let arranged = arrange_books(&sample(false), false, SortBy::Title);
        assert_eq!(titles(&arranged), vec!["Apple", "Banana", "Cherry"]);
    }

    #[test]
    fn test_title_sort_ignores_case() {
        let books = vec![
            book("banana", 1, false),
            book("Apple", 2, false),
            book("cherry", 3, false),
        ];
        let arranged = arrange_books(&books, false, SortBy::Title);
        assert_eq!(titles(&arranged), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_favorite_first_then_date() {
        let books = vec![
            book("Banana", 10, false),
            book("Apple", 5, true),
            book("Cherry", 20, false),
        ];
        let arranged = arrange_books(&books, false, SortBy::Favorite);
        assert_eq!(titles(&arranged), vec!["Apple", "Cherry", "Banana"]);
    }

    #[test]
    fn test_favorites_only_filters() {
        let arranged = arrange_books(&sample(true), true, SortBy::Date);
        assert_eq!(titles(&arranged), vec!["Apple"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(arrange_books(&[], true, SortBy::Title).is_empty());
    }
}

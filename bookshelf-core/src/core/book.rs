use serde::{Deserialize, Serialize};

/// A book as the presentation layer sees it.
///
/// `synopsis` is never absent here: an empty string means "no synopsis".
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub num_page: u32,
    pub synopsis: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub is_favorite: bool,
}

/// A row of the `books` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub num_page: u32,
    pub synopsis: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_favorite: bool,
}

/// Caller-supplied fields for a new book. The ID and timestamps are assigned
/// by the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub num_page: u32,
    pub synopsis: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pages(mut self, num_page: u32) -> Self {
        self.num_page = num_page;
        self
    }

    #[must_use]
    pub fn with_synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = Some(synopsis.into());
        self
    }

    #[must_use]
    pub fn favorite(mut self) -> Self {
        self.is_favorite = true;
        self
    }
}

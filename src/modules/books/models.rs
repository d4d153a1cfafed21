use localreads_library::{Book, FileType, LibraryView, Visibility};
use localreads_scanner::{ScannedBook, UNKNOWN_AUTHOR};
use serde::{Deserialize, Serialize};

/// Fields of a book row that are fixed at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: Option<String>,
    pub author: String,
    pub file_path: String,
    pub file_type: FileType,
    pub file_size: i64,
    pub pages: Option<i64>,
    pub cover_path: Option<String>,
    pub isbn: Option<String>,
}

impl From<ScannedBook> for NewBook {
    fn from(book: ScannedBook) -> Self {
        Self {
            title: Some(book.title),
            author: book.author,
            file_path: book.file_path,
            file_type: book.file_type,
            file_size: book.file_size,
            pages: book.pages,
            cover_path: book.cover_path,
            isbn: None,
        }
    }
}

/// Request model for adding a book by hand, e.g. after an ISBN lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBook {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub pages: Option<i64>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub cover_path: Option<String>,
}

impl CreateBook {
    pub fn into_new_book(self) -> NewBook {
        NewBook {
            title: Some(self.title.trim().to_string()),
            author: self
                .author
                .map(|author| author.trim().to_string())
                .filter(|author| !author.is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            file_path: String::new(),
            file_type: FileType::Manual,
            file_size: 0,
            pages: self.pages,
            cover_path: self.cover_path,
            isbn: self.isbn,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Sections,
    Flat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub layout: Option<Layout>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinishedQuery {
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingRequest {
    pub rating_stars: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisibilityRequest {
    pub visibility: Visibility,
}

/// Books in one flat display order.
#[derive(Debug, Serialize)]
pub struct FlatView<'a> {
    pub filter: String,
    pub total: usize,
    pub books: Vec<&'a Book>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum ViewResponse<'a> {
    Sections(LibraryView<'a>),
    Flat(FlatView<'a>),
}

#[derive(Debug, Serialize)]
pub struct FinishedBooks<'a> {
    pub year: i32,
    pub count: usize,
    pub books: Vec<&'a Book>,
}

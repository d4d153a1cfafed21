//! Domain records shared by the view engine, the HTTP modules, and the CLI.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::error::ModelError;

pub type BookId = i64;
pub type CollectionId = i64;

/// Whether a book shows up in default views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::Hidden => "hidden",
        }
    }
}

impl FromStr for Visibility {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visible" => Ok(Visibility::Visible),
            "hidden" => Ok(Visibility::Hidden),
            other => Err(ModelError::UnknownVisibility(other.to_string())),
        }
    }
}

/// Source format of a library entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Epub,
    Pdf,
    /// Entered by hand (e.g. from an ISBN lookup) without a backing file.
    #[default]
    Manual,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Epub => "epub",
            FileType::Pdf => "pdf",
            FileType::Manual => "manual",
        }
    }
}

impl FromStr for FileType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "epub" => Ok(FileType::Epub),
            "pdf" => Ok(FileType::Pdf),
            "manual" => Ok(FileType::Manual),
            other => Err(ModelError::UnknownFileType(other.to_string())),
        }
    }
}

/// Star rating in `0..=5`, where 0 means unrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 5;
    pub const UNRATED: Rating = Rating(0);

    pub fn new(stars: i64) -> Result<Self, ModelError> {
        Self::try_from(stars)
    }

    pub fn stars(self) -> u8 {
        self.0
    }

    pub fn is_rated(self) -> bool {
        self.0 > 0
    }
}

impl TryFrom<i64> for Rating {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(ModelError::RatingOutOfRange(value))
        }
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        i64::from(rating.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

/// A library entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    /// Display and sort key. Books without a title sort after titled ones.
    pub title: Option<String>,
    pub author: String,
    pub file_path: String,
    pub file_type: FileType,
    pub file_size: i64,
    pub pages: Option<i64>,
    pub current_page: i64,
    /// Fraction read, nominally in `[0, 1]`.
    pub progress: f64,
    /// Stored mirror of `Bucket::of(progress)`. Writers keep it in sync;
    /// the view engine never reads it.
    pub status: Bucket,
    pub visibility: Visibility,
    pub collections: BTreeSet<CollectionId>,
    pub rating_stars: Rating,
    pub review: Option<String>,
    pub cover_path: Option<String>,
    pub isbn: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Book {
    /// Creates an unread, visible, unrated entry with no backing file.
    pub fn new(id: BookId, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            author: "Unknown Author".to_string(),
            file_path: String::new(),
            file_type: FileType::Manual,
            file_size: 0,
            pages: None,
            current_page: 0,
            progress: 0.0,
            status: Bucket::Unread,
            visibility: Visibility::Visible,
            collections: BTreeSet::new(),
            rating_stars: Rating::UNRATED,
            review: None,
            cover_path: None,
            isbn: None,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self.status = Bucket::of(progress);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_collections(mut self, ids: impl IntoIterator<Item = CollectionId>) -> Self {
        self.collections = ids.into_iter().collect();
        self
    }

    /// The bucket this book falls in, derived from `progress` alone.
    pub fn bucket(&self) -> Bucket {
        Bucket::of(self.progress)
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility == Visibility::Hidden
    }

    /// Title for display, with a stable placeholder for untitled entries.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

/// A user-defined grouping of books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_rejects_out_of_range() {
        assert_eq!(Rating::new(6), Err(ModelError::RatingOutOfRange(6)));
        assert_eq!(Rating::new(-1), Err(ModelError::RatingOutOfRange(-1)));
        assert_eq!(Rating::new(5).map(Rating::stars), Ok(5));
        assert!(!Rating::UNRATED.is_rated());
    }

    #[test]
    fn rating_deserializes_from_integer() {
        let rating: Rating = serde_json::from_str("4").unwrap();
        assert_eq!(rating.stars(), 4);
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn visibility_round_trips_through_text() {
        for visibility in [Visibility::Visible, Visibility::Hidden] {
            assert_eq!(visibility.as_str().parse::<Visibility>(), Ok(visibility));
        }
        assert!("archived".parse::<Visibility>().is_err());
    }

    #[test]
    fn with_progress_keeps_status_in_sync() {
        let book = Book::new(1, Some("Dune".into())).with_progress(1.0);
        assert_eq!(book.status, Bucket::Finished);
        assert_eq!(book.bucket(), Bucket::Finished);
    }

    #[test]
    fn book_serializes_collections_as_array() {
        let book = Book::new(3, None).with_collections([7, 2]);
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["collections"], serde_json::json!([2, 7]));
        assert_eq!(json["title"], serde_json::Value::Null);
        assert_eq!(json["status"], "unread");
        assert_eq!(json["visibility"], "visible");
    }
}

//! View scoping: which books a list view is about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::{Book, CollectionId, Visibility};

/// The current view scope.
///
/// Textual form is `all` (or empty), `hidden`, or a collection id, which is
/// what query strings and the CLI state file carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterSelector {
    /// Every visible book.
    #[default]
    All,
    /// Only hidden books, regardless of collection membership.
    Hidden,
    /// Visible books belonging to one collection.
    Collection(CollectionId),
}

impl FilterSelector {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            FilterSelector::All => book.visibility != Visibility::Hidden,
            FilterSelector::Hidden => book.visibility == Visibility::Hidden,
            FilterSelector::Collection(id) => {
                book.visibility != Visibility::Hidden && book.collections.contains(id)
            }
        }
    }
}

impl fmt::Display for FilterSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSelector::All => f.write_str("all"),
            FilterSelector::Hidden => f.write_str("hidden"),
            FilterSelector::Collection(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for FilterSelector {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(FilterSelector::All);
        }
        if trimmed.eq_ignore_ascii_case("hidden") {
            return Ok(FilterSelector::Hidden);
        }
        trimmed
            .parse::<CollectionId>()
            .map(FilterSelector::Collection)
            .map_err(|_| ModelError::InvalidFilter(s.to_string()))
    }
}

impl TryFrom<String> for FilterSelector {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterSelector> for String {
    fn from(selector: FilterSelector) -> Self {
        selector.to_string()
    }
}

/// Returns the books in scope for `selector`, in input order.
pub fn filter_books(books: &[Book], selector: FilterSelector) -> Vec<&Book> {
    books.iter().filter(|book| selector.matches(book)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Vec<Book> {
        vec![
            Book::new(1, Some("Visible".into())).with_collections([7]),
            Book::new(2, Some("Hidden".into()))
                .with_visibility(Visibility::Hidden)
                .with_collections([7]),
            Book::new(3, Some("Loose".into())),
        ]
    }

    fn ids(books: &[&Book]) -> Vec<i64> {
        books.iter().map(|b| b.id).collect()
    }

    #[test]
    fn all_excludes_hidden_books() {
        let books = library();
        assert_eq!(ids(&filter_books(&books, FilterSelector::All)), vec![1, 3]);
    }

    #[test]
    fn hidden_ignores_collections() {
        let books = library();
        assert_eq!(ids(&filter_books(&books, FilterSelector::Hidden)), vec![2]);
    }

    #[test]
    fn collection_requires_membership_and_visibility() {
        let books = library();
        assert_eq!(
            ids(&filter_books(&books, FilterSelector::Collection(7))),
            vec![1]
        );
    }

    #[test]
    fn unknown_collection_is_empty_not_error() {
        let books = library();
        assert!(filter_books(&books, FilterSelector::Collection(99)).is_empty());
    }

    #[test]
    fn filtering_leaves_input_untouched() {
        let books = library();
        let before = books.clone();
        let _ = filter_books(&books, FilterSelector::Hidden);
        assert_eq!(books, before);
    }

    #[test]
    fn parses_textual_forms() {
        assert_eq!("".parse(), Ok(FilterSelector::All));
        assert_eq!(" All ".parse(), Ok(FilterSelector::All));
        assert_eq!("hidden".parse(), Ok(FilterSelector::Hidden));
        assert_eq!("42".parse(), Ok(FilterSelector::Collection(42)));
        assert_eq!(
            "favourites".parse::<FilterSelector>(),
            Err(ModelError::InvalidFilter("favourites".into()))
        );
    }

    #[test]
    fn display_round_trips() {
        for selector in [
            FilterSelector::All,
            FilterSelector::Hidden,
            FilterSelector::Collection(12),
        ] {
            assert_eq!(selector.to_string().parse(), Ok(selector));
        }
    }

    #[test]
    fn serde_uses_text_form() {
        let json = serde_json::to_string(&FilterSelector::Collection(5)).unwrap();
        assert_eq!(json, "\"5\"");
        let back: FilterSelector = serde_json::from_str("\"hidden\"").unwrap();
        assert_eq!(back, FilterSelector::Hidden);
    }
}

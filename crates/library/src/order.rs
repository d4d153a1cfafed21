//! Display ordering.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::model::Book;

/// Compares two optional titles for display.
///
/// Titles compare on a collation key: canonically decomposed, accents
/// dropped, lowercased, surrounding whitespace ignored. `Émile` therefore
/// sorts among the E's rather than after `Z`. Missing titles sort after all present
/// ones. Titles with equal keys compare `Equal`, so a stable sort keeps their
/// input order.
pub fn compare_titles(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => fold(a).cmp(fold(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn fold(title: &str) -> impl Iterator<Item = char> + '_ {
    title
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// The flat display order: bucket first, then title.
pub fn display_order(a: &Book, b: &Book) -> Ordering {
    a.bucket()
        .cmp(&b.bucket())
        .then_with(|| compare_titles(a.title.as_deref(), b.title.as_deref()))
}

/// Returns the books in flat display order. The sort is stable.
pub fn sort_books<'a, I>(books: I) -> Vec<&'a Book>
where
    I: IntoIterator<Item = &'a Book>,
{
    let mut sorted: Vec<&Book> = books.into_iter().collect();
    sorted.sort_by(|a, b| display_order(a, b));
    sorted
}

/// Returns the books ordered by title alone. The sort is stable.
pub fn sort_by_title<'a, I>(books: I) -> Vec<&'a Book>
where
    I: IntoIterator<Item = &'a Book>,
{
    let mut sorted: Vec<&Book> = books.into_iter().collect();
    sorted.sort_by(|a, b| compare_titles(a.title.as_deref(), b.title.as_deref()));
    sorted
}

use serde::Serialize;

use crate::bucket::{Bucket, Buckets};
use crate::model::Book;
use crate::order::sort_by_title;

/// A labelled, non-empty run of books ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct Section<'a> {
    pub bucket: Bucket,
    pub label: &'static str,
    pub count: usize,
    pub books: Vec<&'a Book>,
}

impl Section<'_> {
    /// Heading text, e.g. `Unread` or `Unread (4)`.
    pub fn heading(&self, show_count: bool) -> String {
        if show_count {
            format!("{} ({})", self.label, self.count)
        } else {
            self.label.to_string()
        }
    }
}

/// Turns buckets into sections in display order, title-sorting each one and
/// dropping empty buckets.
pub fn build_sections(buckets: Buckets<'_>) -> Vec<Section<'_>> {
    buckets
        .into_parts()
        .into_iter()
        .filter(|(_, books)| !books.is_empty())
        .map(|(bucket, books)| {
            let books = sort_by_title(books);
            Section {
                bucket,
                label: bucket.label(),
                count: books.len(),
                books,
            }
        })
        .collect()
}

//! The full pipeline: filter, categorize, order, section.

use serde::Serialize;

use crate::bucket::categorize;
use crate::filter::{filter_books, FilterSelector};
use crate::model::Book;
use crate::order::sort_books;
use crate::section::{build_sections, Section};

/// A categorized view of one library snapshot.
///
/// Borrowing from the snapshot, it is rebuilt from scratch whenever the book
/// set or the selector changes.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryView<'a> {
    pub filter: FilterSelector,
    pub total: usize,
    pub sections: Vec<Section<'a>>,
}

impl<'a> LibraryView<'a> {
    pub fn build(books: &'a [Book], filter: FilterSelector) -> Self {
        let in_scope = filter_books(books, filter);
        let total = in_scope.len();
        let sections = build_sections(categorize(in_scope));
        Self {
            filter,
            total,
            sections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Sections concatenated into one sequence.
    pub fn flatten(&self) -> Vec<&'a Book> {
        self.sections
            .iter()
            .flat_map(|section| section.books.iter().copied())
            .collect()
    }
}

/// Books in scope for `filter`, in one flat display order (grid views).
pub fn flat_view(books: &[Book], filter: FilterSelector) -> Vec<&Book> {
    sort_books(filter_books(books, filter))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use crate::bucket::Bucket;
    use crate::model::Visibility;

    fn book(id: i64, title: &str, progress: f64) -> Book {
        Book::new(id, Some(title.to_string())).with_progress(progress)
    }

    fn ids(books: &[&Book]) -> Vec<i64> {
        books.iter().map(|b| b.id).collect()
    }

    #[test]
    fn mixed_progress_yields_three_sections() {
        let books = [book(1, "Zed", 0.5), book(2, "Abe", 0.0), book(3, "Mid", 1.0)];
        let view = LibraryView::build(&books, FilterSelector::All);

        let shape: Vec<(&str, Vec<i64>)> = view
            .sections
            .iter()
            .map(|s| (s.label, ids(&s.books)))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("Currently Reading", vec![1]),
                ("Unread", vec![2]),
                ("Finished", vec![3]),
            ]
        );
    }

    #[test]
    fn hidden_book_only_appears_under_hidden() {
        let books = [
            book(1, "Shown", 0.0),
            book(2, "Tucked Away", 0.2).with_visibility(Visibility::Hidden),
        ];

        let default_view = LibraryView::build(&books, FilterSelector::All);
        assert_eq!(ids(&default_view.flatten()), vec![1]);

        let hidden_view = LibraryView::build(&books, FilterSelector::Hidden);
        assert_eq!(ids(&hidden_view.flatten()), vec![2]);
        assert_eq!(hidden_view.sections.len(), 1);
    }

    #[test]
    fn duplicate_titles_keep_relative_order() {
        let books = [book(5, "Same", 0.3), book(4, "Same", 0.3)];
        assert_eq!(ids(&flat_view(&books, FilterSelector::All)), vec![5, 4]);
    }

    #[test]
    fn collection_without_members_has_no_sections() {
        let books = [book(1, "A", 0.0).with_collections([3]), book(2, "B", 1.0)];
        let view = LibraryView::build(&books, FilterSelector::Collection(7));
        assert!(view.sections.is_empty());
        assert!(view.is_empty());
    }

    #[test]
    fn float_overshoot_is_finished_not_a_fourth_bucket() {
        let books = [book(1, "Overshoot", 1.000_000_000_1)];
        let view = LibraryView::build(&books, FilterSelector::All);
        assert_eq!(view.sections.len(), 1);
        assert_eq!(view.sections[0].bucket, Bucket::Finished);
    }

    fn arb_book() -> impl Strategy<Value = (Option<String>, f64, bool, Vec<i64>)> {
        let title = prop_oneof![
            Just(None),
            "[a-dA-D]{0,3}".prop_map(Some),
        ];
        let progress = prop_oneof![
            Just(0.0),
            Just(1.0),
            0.0..=1.0f64,
            -2.0..3.0f64,
        ];
        let collections = prop::collection::vec(1..4i64, 0..3);
        (title, progress, any::<bool>(), collections)
    }

    fn arb_library() -> impl Strategy<Value = Vec<Book>> {
        prop::collection::vec(arb_book(), 0..24).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (title, progress, hidden, collections))| {
                    let visibility = if hidden {
                        Visibility::Hidden
                    } else {
                        Visibility::Visible
                    };
                    Book::new(i as i64, title)
                        .with_progress(progress)
                        .with_visibility(visibility)
                        .with_collections(collections)
                })
                .collect()
        })
    }

    fn arb_filter() -> impl Strategy<Value = FilterSelector> {
        prop_oneof![
            Just(FilterSelector::All),
            Just(FilterSelector::Hidden),
            (1..5i64).prop_map(FilterSelector::Collection),
        ]
    }

    proptest! {
        #[test]
        fn buckets_partition_the_filtered_set(books in arb_library(), filter in arb_filter()) {
            let in_scope = filter_books(&books, filter);
            let buckets = categorize(in_scope.iter().copied());

            let mut seen = Vec::new();
            for bucket in Bucket::ALL {
                for book in buckets.get(bucket) {
                    prop_assert_eq!(book.bucket(), bucket);
                    seen.push(book.id);
                }
            }
            let unique: HashSet<i64> = seen.iter().copied().collect();
            prop_assert_eq!(unique.len(), seen.len());

            let mut expected = ids(&in_scope);
            expected.sort_unstable();
            seen.sort_unstable();
            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn sorting_is_idempotent(books in arb_library()) {
            let once: Vec<Book> = sort_books(&books).into_iter().cloned().collect();
            let twice = sort_books(&once);
            prop_assert_eq!(ids(&twice), once.iter().map(|b| b.id).collect::<Vec<_>>());
        }

        #[test]
        fn sorting_is_stable_for_equal_keys(books in arb_library()) {
            let sorted = sort_books(&books);
            for pair in sorted.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if crate::order::display_order(a, b) == std::cmp::Ordering::Equal {
                    // ids were assigned in input order
                    prop_assert!(a.id < b.id);
                }
            }
        }

        #[test]
        fn sections_concatenate_to_flat_order(books in arb_library(), filter in arb_filter()) {
            let view = LibraryView::build(&books, filter);
            prop_assert_eq!(ids(&view.flatten()), ids(&flat_view(&books, filter)));
            prop_assert_eq!(view.total, filter_books(&books, filter).len());
            prop_assert!(view.sections.iter().all(|s| s.count == s.books.len() && s.count > 0));
        }
    }
}

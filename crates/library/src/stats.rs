use chrono::Datelike;

use crate::bucket::Bucket;
use crate::model::Book;
use crate::order::sort_by_title;

/// Visible books finished during `year`, ordered by title.
///
/// Completion is judged from progress; the finish date is approximated by
/// `last_updated`, which is the last write to the book.
pub fn finished_in_year(books: &[Book], year: i32) -> Vec<&Book> {
    sort_by_title(books.iter().filter(|book| {
        !book.is_hidden() && book.bucket() == Bucket::Finished && book.last_updated.year() == year
    }))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::Visibility;

    fn finished_on(id: i64, title: &str, year: i32) -> Book {
        let mut book = Book::new(id, Some(title.into())).with_progress(1.0);
        book.last_updated = Utc.with_ymd_and_hms(year, 6, 1, 12, 0, 0).unwrap();
        book
    }

    #[test]
    fn counts_only_this_years_finished_books() {
        let mut stale_status = finished_on(4, "Reading Still", 2025).with_progress(0.5);
        stale_status.status = Bucket::Finished;

        let books = vec![
            finished_on(1, "Old", 2024),
            finished_on(2, "New B", 2025),
            finished_on(3, "New A", 2025),
            stale_status,
            finished_on(5, "Hidden", 2025).with_visibility(Visibility::Hidden),
        ];

        let ids: Vec<i64> = finished_in_year(&books, 2025).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}

//! Progress-based categorization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::Book;

/// One of the three progress-derived categories.
///
/// Variant order is the canonical display order, so `Ord` sorts reading
/// books before unread ones before finished ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Reading,
    Unread,
    Finished,
}

impl Bucket {
    /// All buckets in display order.
    pub const ALL: [Bucket; 3] = [Bucket::Reading, Bucket::Unread, Bucket::Finished];

    /// Classifies a progress value.
    ///
    /// Exactly `0` is unread and exactly `1` is finished. Values outside
    /// `[0, 1]` clamp to the nearest end, so `-0.2` is unread and
    /// `1.0000000001` is finished. `NaN` counts as no recorded progress.
    pub fn of(progress: f64) -> Self {
        if progress.is_nan() || progress <= 0.0 {
            Bucket::Unread
        } else if progress >= 1.0 {
            Bucket::Finished
        } else {
            Bucket::Reading
        }
    }

    /// Section heading shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Reading => "Currently Reading",
            Bucket::Unread => "Unread",
            Bucket::Finished => "Finished",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Reading => "reading",
            Bucket::Unread => "unread",
            Bucket::Finished => "finished",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reading" => Ok(Bucket::Reading),
            "unread" => Ok(Bucket::Unread),
            // older databases stored "completed"
            "finished" | "completed" => Ok(Bucket::Finished),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

/// The filtered set split into its three buckets.
///
/// Each list keeps the relative order the books arrived in.
#[derive(Debug, Clone, Default)]
pub struct Buckets<'a> {
    pub reading: Vec<&'a Book>,
    pub unread: Vec<&'a Book>,
    pub finished: Vec<&'a Book>,
}

impl<'a> Buckets<'a> {
    pub fn get(&self, bucket: Bucket) -> &[&'a Book] {
        match bucket {
            Bucket::Reading => &self.reading,
            Bucket::Unread => &self.unread,
            Bucket::Finished => &self.finished,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<&'a Book> {
        match bucket {
            Bucket::Reading => &mut self.reading,
            Bucket::Unread => &mut self.unread,
            Bucket::Finished => &mut self.finished,
        }
    }

    pub fn len(&self) -> usize {
        self.reading.len() + self.unread.len() + self.finished.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the buckets, yielding `(bucket, books)` pairs in display order.
    pub fn into_parts(self) -> [(Bucket, Vec<&'a Book>); 3] {
        [
            (Bucket::Reading, self.reading),
            (Bucket::Unread, self.unread),
            (Bucket::Finished, self.finished),
        ]
    }
}

/// Partitions books by progress. Every input book lands in exactly one bucket.
pub fn categorize<'a, I>(books: I) -> Buckets<'a>
where
    I: IntoIterator<Item = &'a Book>,
{
    let mut buckets = Buckets::default();
    for book in books {
        buckets.get_mut(book.bucket()).push(book);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, progress: f64) -> Book {
        Book::new(id, Some(format!("Book {id}"))).with_progress(progress)
    }

    #[test]
    fn boundaries_are_strict() {
        assert_eq!(Bucket::of(0.0), Bucket::Unread);
        assert_eq!(Bucket::of(1.0), Bucket::Finished);
        assert_eq!(Bucket::of(f64::MIN_POSITIVE), Bucket::Reading);
        assert_eq!(Bucket::of(0.999_999), Bucket::Reading);
    }

    #[test]
    fn out_of_range_clamps_to_nearest_bucket() {
        assert_eq!(Bucket::of(1.000_000_000_1), Bucket::Finished);
        assert_eq!(Bucket::of(42.0), Bucket::Finished);
        assert_eq!(Bucket::of(-0.25), Bucket::Unread);
        assert_eq!(Bucket::of(f64::NEG_INFINITY), Bucket::Unread);
        assert_eq!(Bucket::of(f64::INFINITY), Bucket::Finished);
        assert_eq!(Bucket::of(f64::NAN), Bucket::Unread);
    }

    #[test]
    fn page_ratio_of_exactly_one_is_finished() {
        let (current_page, pages) = (317_i64, 317_i64);
        assert_eq!(Bucket::of(current_page as f64 / pages as f64), Bucket::Finished);
    }

    #[test]
    fn categorize_ignores_stored_status() {
        let mut stale = book(1, 0.5);
        stale.status = Bucket::Finished;
        let books = [stale];

        let buckets = categorize(&books);
        assert_eq!(buckets.reading.len(), 1);
        assert!(buckets.finished.is_empty());
    }

    #[test]
    fn categorize_keeps_arrival_order() {
        let books = [book(1, 0.2), book(2, 0.0), book(3, 0.7), book(4, 1.0)];
        let buckets = categorize(&books);

        let ids = |list: &[&Book]| list.iter().map(|b| b.id).collect::<Vec<_>>();
        assert_eq!(ids(&buckets.reading), vec![1, 3]);
        assert_eq!(ids(&buckets.unread), vec![2]);
        assert_eq!(ids(&buckets.finished), vec![4]);
        assert_eq!(buckets.len(), books.len());
    }

    #[test]
    fn status_text_accepts_legacy_completed() {
        assert_eq!("completed".parse::<Bucket>(), Ok(Bucket::Finished));
        assert!("paused".parse::<Bucket>().is_err());
    }
}

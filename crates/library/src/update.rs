//! Typed partial updates to a book's reading state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::bucket::Bucket;
use crate::error::ModelError;
use crate::model::{Book, Rating};

/// Progress change: either field may be given; the other is derived from
/// the book's page count when it has one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub current_page: Option<i64>,
}

/// Partial update of the user-editable fields of a book.
///
/// Absent fields are left untouched. `review` distinguishes an absent key
/// (`None`) from an explicit clear (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub current_page: Option<i64>,
    #[serde(default)]
    pub rating_stars: Option<Rating>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub review: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<ProgressUpdate> for BookUpdate {
    fn from(update: ProgressUpdate) -> Self {
        Self {
            progress: update.progress,
            current_page: update.current_page,
            ..Self::default()
        }
    }
}

impl BookUpdate {
    pub fn rating(stars: Rating) -> Self {
        Self {
            rating_stars: Some(stars),
            ..Self::default()
        }
    }

    pub fn review(text: Option<String>) -> Self {
        Self {
            review: Some(text),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_none()
            && self.current_page.is_none()
            && self.rating_stars.is_none()
            && self.review.is_none()
    }

    /// Returns `book` with this update applied.
    ///
    /// Progress is clamped into `[0, 1]` and `status` is re-derived from it,
    /// so stored status never drifts from progress. A blank review clears it.
    pub fn apply(&self, book: &Book, now: DateTime<Utc>) -> Result<Book, ModelError> {
        let mut updated = book.clone();

        if let Some(progress) = self.progress {
            if !progress.is_finite() {
                return Err(ModelError::InvalidProgress(progress));
            }
        }
        if let Some(page) = self.current_page {
            if page < 0 {
                return Err(ModelError::NegativePage(page));
            }
        }

        let pages = book.pages.filter(|&pages| pages > 0);
        match (self.progress, self.current_page) {
            (Some(progress), page) => {
                let progress = progress.clamp(0.0, 1.0);
                updated.progress = progress;
                updated.current_page = match (page, pages) {
                    (Some(page), _) => page,
                    (None, Some(pages)) => (progress * pages as f64).round() as i64,
                    (None, None) => book.current_page,
                };
            }
            (None, Some(page)) => {
                updated.current_page = page;
                if let Some(pages) = pages {
                    updated.progress = (page as f64 / pages as f64).min(1.0);
                }
            }
            (None, None) => {}
        }
        updated.status = Bucket::of(updated.progress);

        if let Some(rating) = self.rating_stars {
            updated.rating_stars = rating;
        }
        if let Some(review) = &self.review {
            updated.review = review
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string);
        }

        updated.last_updated = now;
        Ok(updated)
    }
}

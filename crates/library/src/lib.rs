//! Library view engine.
//!
//! A pure pipeline from a snapshot of books and a filter selector to an
//! ordered, categorized view: filter → categorize → order → section.
//! Nothing here performs I/O; callers rebuild views after every mutation.

pub mod bucket;
pub mod error;
pub mod filter;
pub mod model;
pub mod order;
pub mod section;
pub mod stats;
pub mod update;
pub mod view;

pub use bucket::{categorize, Bucket, Buckets};
pub use error::ModelError;
pub use filter::{filter_books, FilterSelector};
pub use model::{Book, BookId, Collection, CollectionId, FileType, Rating, Visibility};
pub use order::{compare_titles, sort_books};
pub use section::{build_sections, Section};
pub use stats::finished_in_year;
pub use update::{BookUpdate, ProgressUpdate};
pub use view::{flat_view, LibraryView};

//! Book discovery and metadata extraction for Localreads.
//!
//! Everything here is blocking filesystem work; async callers run it on
//! `tokio::task::spawn_blocking`.

pub mod epub;
pub mod error;
pub mod hash;
pub mod pdf;
pub mod placeholder;
pub mod scan;

pub use error::{Result, ScanError};
pub use placeholder::PlaceholderCover;
pub use scan::{ScanOutcome, ScannedBook, Scanner, UNKNOWN_AUTHOR};

use thiserror::Error;

/// Errors raised while parsing or validating library values.
///
/// The view pipeline itself never fails; these only surface when text or
/// request payloads are turned into typed values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid filter '{0}'; expected 'all', 'hidden', or a collection id")]
    InvalidFilter(String),

    #[error("rating must be between 0 and 5, got {0}")]
    RatingOutOfRange(i64),

    #[error("progress must be a finite number, got {0}")]
    InvalidProgress(f64),

    #[error("current page must not be negative, got {0}")]
    NegativePage(i64),

    #[error("unknown visibility '{0}'")]
    UnknownVisibility(String),

    #[error("unknown reading status '{0}'")]
    UnknownStatus(String),

    #[error("unknown file type '{0}'")]
    UnknownFileType(String),
}

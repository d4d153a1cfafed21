use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("books directory does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid EPUB archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("malformed XML in {entry}: {message}")]
    Xml { entry: String, message: String },

    #[error("EPUB is missing {0}")]
    MissingEntry(String),

    #[error("unreadable PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("unusable font {path}: {message}")]
    Font { path: PathBuf, message: String },

    #[error("cover rendering failed: {0}")]
    Image(#[from] image::ImageError),
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(entry: &str, err: impl std::fmt::Display) -> Self {
        Self::Xml {
            entry: entry.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

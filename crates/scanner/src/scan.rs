use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use localreads_library::FileType;
use walkdir::WalkDir;

use crate::epub;
use crate::error::{Result, ScanError};
use crate::hash::sha256_file;
use crate::pdf;
use crate::placeholder::PlaceholderCover;

pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// URL prefix under which the covers directory is served.
const COVERS_URL_PREFIX: &str = "covers";

/// A newly discovered book, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedBook {
    pub title: String,
    pub author: String,
    pub file_path: String,
    pub file_type: FileType,
    pub file_size: i64,
    pub pages: Option<i64>,
    pub cover_path: Option<String>,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Regular files visited, book or not.
    pub scanned_files: usize,
    /// Book files skipped because their path is already known.
    pub skipped: usize,
    pub books: Vec<ScannedBook>,
    pub errors: usize,
}

/// Walks a books directory and extracts metadata for files not seen before.
#[derive(Debug, Clone)]
pub struct Scanner {
    covers_dir: PathBuf,
    placeholder: PlaceholderCover,
}

impl Scanner {
    /// A scanner whose placeholder covers carry no text; see
    /// [`Scanner::with_placeholder`].
    pub fn new(covers_dir: impl Into<PathBuf>) -> Self {
        Self {
            covers_dir: covers_dir.into(),
            placeholder: PlaceholderCover::default(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: PlaceholderCover) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Scan `root` recursively. Paths in `known` are skipped; failures on
    /// individual files are counted in `errors` and never abort the walk.
    pub fn scan(&self, root: &Path, known: &HashSet<String>) -> Result<ScanOutcome> {
        if !root.is_dir() {
            return Err(ScanError::MissingRoot(root.to_path_buf()));
        }
        fs::create_dir_all(&self.covers_dir).map_err(|err| ScanError::io(&self.covers_dir, err))?;

        let mut outcome = ScanOutcome::default();
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    outcome.errors += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            outcome.scanned_files += 1;

            let Some(file_type) = book_type(entry.path()) else {
                continue;
            };
            let file_path = entry.path().to_string_lossy().into_owned();
            if known.contains(&file_path) {
                outcome.skipped += 1;
                continue;
            }

            match self.read_book(entry.path(), file_type) {
                Ok(book) => {
                    tracing::debug!(path = %file_path, title = %book.title, "discovered book");
                    outcome.books.push(book);
                }
                Err(err) => {
                    tracing::warn!(path = %file_path, error = %err, "failed to read book");
                    outcome.errors += 1;
                }
            }
        }

        tracing::info!(
            root = %root.display(),
            scanned_files = outcome.scanned_files,
            new_books = outcome.books.len(),
            skipped = outcome.skipped,
            errors = outcome.errors,
            "library scan finished"
        );
        Ok(outcome)
    }

    /// Extract metadata for one file. Only I/O failures on the file itself
    /// are errors; unparseable metadata falls back to the file stem.
    pub fn read_book(&self, path: &Path, file_type: FileType) -> Result<ScannedBook> {
        let file_size = fs::metadata(path)
            .map_err(|err| ScanError::io(path, err))?
            .len() as i64;
        let digest = sha256_file(path).map_err(|err| ScanError::io(path, err))?;

        let (title, author, pages, cover) = match file_type {
            FileType::Epub => match epub::read_epub(path) {
                Ok(meta) => (meta.title, meta.author, None, meta.cover),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "EPUB metadata unavailable");
                    (None, None, None, None)
                }
            },
            FileType::Pdf => match pdf::read_pdf(path) {
                Ok(meta) => (meta.title, meta.author, Some(meta.pages), None),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "PDF metadata unavailable");
                    (None, None, None, None)
                }
            },
            FileType::Manual => (None, None, None, None),
        };

        let title = title.unwrap_or_else(|| file_stem(path));
        let author = author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        let cover_path = match (file_type, cover) {
            (_, Some(cover)) => self.save_cover(&digest, &cover.extension(), &cover.bytes),
            (FileType::Epub, None) => self.placeholder_cover(&digest, &title, &author),
            _ => None,
        };

        Ok(ScannedBook {
            title,
            author,
            file_path: path.to_string_lossy().into_owned(),
            file_type,
            file_size,
            pages,
            cover_path,
        })
    }

    /// Covers are named after the book file's hash, so rescans overwrite in place.
    fn save_cover(&self, digest: &str, extension: &str, bytes: &[u8]) -> Option<String> {
        let file_name = format!("cover_{digest}.{extension}");
        let target = self.covers_dir.join(&file_name);
        match fs::write(&target, bytes) {
            Ok(()) => Some(format!("{}/{}", COVERS_URL_PREFIX, file_name)),
            Err(err) => {
                tracing::warn!(path = %target.display(), error = %err, "failed to write cover");
                None
            }
        }
    }

    fn placeholder_cover(&self, digest: &str, title: &str, author: &str) -> Option<String> {
        match self.placeholder.render(title, author) {
            Ok(png) => self.save_cover(digest, "png", &png),
            Err(err) => {
                tracing::warn!(title = %title, error = %err, "failed to render placeholder cover");
                None
            }
        }
    }
}

/// Book format by extension, case-insensitively.
pub fn book_type(path: &Path) -> Option<FileType> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "epub" => Some(FileType::Epub),
        "pdf" => Some(FileType::Pdf),
        _ => None,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use localreads_http::error::AppError;
use localreads_kernel::settings::LibrarySettings;
use localreads_kernel::Module;
use localreads_scanner::{PlaceholderCover, ScanOutcome, Scanner};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;

use crate::modules::books::{models::NewBook, repo as books};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Error,
}

/// Summary returned to the caller after a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub status: ScanStatus,
    pub message: String,
    pub scanned_files: usize,
    pub new_books: usize,
    pub errors: usize,
}

/// Scan `books_dir` and store every book whose path is not known yet.
/// Covers go to `library.covers_dir`.
///
/// A missing or unreadable books directory yields an `error` report rather
/// than an `Err`; `Err` is reserved for database failures.
pub async fn run_scan(
    pool: &SqlitePool,
    books_dir: PathBuf,
    library: &LibrarySettings,
) -> anyhow::Result<ScanReport> {
    let known = books::known_paths(pool).await?;
    let scanner = Scanner::new(library.covers_dir.clone())
        .with_placeholder(PlaceholderCover::discover(library.cover_font.as_deref()));
    let root = books_dir.clone();

    let scanned = tokio::task::spawn_blocking(move || scanner.scan(&root, &known))
        .await
        .context("scan task panicked")?;

    let outcome: ScanOutcome = match scanned {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(books_dir = %books_dir.display(), error = %err, "scan failed");
            return Ok(ScanReport {
                status: ScanStatus::Error,
                message: format!("Scanning failed: {err}"),
                scanned_files: 0,
                new_books: 0,
                errors: 1,
            });
        }
    };

    let mut new_books = 0;
    let mut errors = outcome.errors;
    for scanned in outcome.books {
        let path = scanned.file_path.clone();
        match books::insert(pool, &NewBook::from(scanned)).await {
            Ok(book) => {
                tracing::info!(book_id = book.id, path = %path, "book added");
                new_books += 1;
            }
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "failed to store scanned book");
                errors += 1;
            }
        }
    }

    Ok(ScanReport {
        status: ScanStatus::Success,
        message: "Scanning completed".to_string(),
        scanned_files: outcome.scanned_files,
        new_books,
        errors,
    })
}

/// Scan: imports EPUB and PDF files from the configured books directory.
pub struct ScanModule {
    pool: SqlitePool,
    library: LibrarySettings,
}

impl ScanModule {
    pub fn new(pool: SqlitePool, library: LibrarySettings) -> Self {
        Self { pool, library }
    }
}

#[derive(Clone)]
struct ScanState {
    pool: SqlitePool,
    library: LibrarySettings,
}

#[async_trait]
impl Module for ScanModule {
    fn name(&self) -> &'static str {
        "scan"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(scan_library))
            .with_state(ScanState {
                pool: self.pool.clone(),
                library: self.library.clone(),
            })
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Scan the books directory for new EPUB and PDF files",
                        "tags": ["Scan"],
                        "responses": {
                            "200": {
                                "description": "Scan report",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ScanReport" } }
                                }
                            },
                            "500": {
                                "description": "Internal server error",
                                "content": {
                                    "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "ScanReport": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string", "enum": ["success", "error"] },
                            "message": { "type": "string" },
                            "scanned_files": { "type": "integer" },
                            "new_books": { "type": "integer" },
                            "errors": { "type": "integer" }
                        },
                        "required": ["status", "message", "scanned_files", "new_books", "errors"]
                    }
                }
            }
        }))
    }
}

async fn scan_library(State(state): State<ScanState>) -> Result<Json<ScanReport>, AppError> {
    let report = run_scan(&state.pool, state.library.books_dir.clone(), &state.library).await?;
    Ok(Json(report))
}

/// Create a new instance of the scan module
pub fn create_module(pool: SqlitePool, library: LibrarySettings) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ScanModule::new(pool, library))
}

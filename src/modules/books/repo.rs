//! SQLite persistence for books.
//!
//! Reads always return complete [`Book`] values, collection memberships
//! included, so a list call is a ready-made snapshot for the view engine.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use localreads_library::{Book, BookId, CollectionId, ModelError, Rating, Visibility};
use sqlx::SqlitePool;

use super::models::NewBook;

pub const MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    title         TEXT,
    author        TEXT    NOT NULL DEFAULT 'Unknown Author',
    file_path     TEXT    NOT NULL DEFAULT '',
    file_type     TEXT    NOT NULL DEFAULT 'manual',
    file_size     INTEGER NOT NULL DEFAULT 0,
    pages         INTEGER,
    current_page  INTEGER NOT NULL DEFAULT 0,
    progress      REAL    NOT NULL DEFAULT 0,
    status        TEXT    NOT NULL DEFAULT 'unread',
    visibility    TEXT    NOT NULL DEFAULT 'visible',
    rating_stars  INTEGER NOT NULL DEFAULT 0 CHECK (rating_stars BETWEEN 0 AND 5),
    review        TEXT,
    cover_path    TEXT,
    isbn          TEXT,
    created_at    TEXT    NOT NULL,
    last_updated  TEXT    NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS books_file_path_unique ON books (file_path) WHERE file_path <> '';
"#;

const SELECT_BOOKS: &str = "SELECT b.id, b.title, b.author, b.file_path, b.file_type, b.file_size, \
     b.pages, b.current_page, b.progress, b.status, b.visibility, b.rating_stars, b.review, \
     b.cover_path, b.isbn, b.created_at, b.last_updated, \
     GROUP_CONCAT(bc.collection_id) AS collection_ids \
     FROM books b LEFT JOIN book_collections bc ON bc.book_id = b.id";

#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: Option<String>,
    author: String,
    file_path: String,
    file_type: String,
    file_size: i64,
    pages: Option<i64>,
    current_page: i64,
    progress: f64,
    status: String,
    visibility: String,
    rating_stars: i64,
    review: Option<String>,
    cover_path: Option<String>,
    isbn: Option<String>,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    collection_ids: Option<String>,
}

impl BookRow {
    fn into_book(self) -> Result<Book, ModelError> {
        Ok(Book {
            id: self.id,
            title: self.title,
            author: self.author,
            file_path: self.file_path,
            file_type: self.file_type.parse()?,
            file_size: self.file_size,
            pages: self.pages,
            current_page: self.current_page,
            progress: self.progress,
            status: self.status.parse()?,
            visibility: self.visibility.parse()?,
            collections: parse_ids(self.collection_ids.as_deref()),
            rating_stars: Rating::new(self.rating_stars)?,
            review: self.review,
            cover_path: self.cover_path,
            isbn: self.isbn,
            created_at: self.created_at,
            last_updated: self.last_updated,
        })
    }
}

fn parse_ids(joined: Option<&str>) -> BTreeSet<CollectionId> {
    joined
        .unwrap_or_default()
        .split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}

fn decode(rows: Vec<BookRow>) -> sqlx::Result<Vec<Book>> {
    rows.into_iter()
        .map(|row| row.into_book().map_err(|err| sqlx::Error::Decode(Box::new(err))))
        .collect()
}

/// Every book, in id order.
pub async fn list_all(pool: &SqlitePool) -> sqlx::Result<Vec<Book>> {
    let sql = format!("{SELECT_BOOKS} GROUP BY b.id ORDER BY b.id");
    let rows: Vec<BookRow> = sqlx::query_as(&sql).fetch_all(pool).await?;
    decode(rows)
}

/// One page of books, in id order.
pub async fn list_page(pool: &SqlitePool, skip: i64, limit: i64) -> sqlx::Result<Vec<Book>> {
    let sql = format!("{SELECT_BOOKS} GROUP BY b.id ORDER BY b.id LIMIT ? OFFSET ?");
    let rows: Vec<BookRow> = sqlx::query_as(&sql)
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await?;
    decode(rows)
}

/// Fetch one book; `RowNotFound` when it does not exist.
pub async fn get(pool: &SqlitePool, id: BookId) -> sqlx::Result<Book> {
    let sql = format!("{SELECT_BOOKS} WHERE b.id = ? GROUP BY b.id");
    let row: BookRow = sqlx::query_as(&sql).bind(id).fetch_one(pool).await?;
    row.into_book()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

pub async fn exists(pool: &SqlitePool, id: BookId) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM books WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Insert an unread, visible, unrated book and return it.
pub async fn insert(pool: &SqlitePool, book: &NewBook) -> sqlx::Result<Book> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO books (title, author, file_path, file_type, file_size, pages, cover_path, isbn, \
         current_page, progress, status, visibility, rating_stars, created_at, last_updated) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0, 'unread', 'visible', 0, ?, ?)",
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.file_path)
    .bind(book.file_type.as_str())
    .bind(book.file_size)
    .bind(book.pages)
    .bind(&book.cover_path)
    .bind(&book.isbn)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get(pool, result.last_insert_rowid()).await
}

/// Persist the user-editable reading state of `book`.
pub async fn save_reading_state(pool: &SqlitePool, book: &Book) -> sqlx::Result<()> {
    let result = sqlx::query(
        "UPDATE books SET progress = ?, current_page = ?, status = ?, rating_stars = ?, \
         review = ?, last_updated = ? WHERE id = ?",
    )
    .bind(book.progress)
    .bind(book.current_page)
    .bind(book.status.as_str())
    .bind(i64::from(book.rating_stars.stars()))
    .bind(&book.review)
    .bind(book.last_updated)
    .bind(book.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn set_visibility(
    pool: &SqlitePool,
    id: BookId,
    visibility: Visibility,
) -> sqlx::Result<Book> {
    let result = sqlx::query("UPDATE books SET visibility = ?, last_updated = ? WHERE id = ?")
        .bind(visibility.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    get(pool, id).await
}

/// File paths of every stored book that has a backing file.
pub async fn known_paths(pool: &SqlitePool) -> sqlx::Result<HashSet<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT file_path FROM books WHERE file_path <> ''")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(path,)| path).collect())
}

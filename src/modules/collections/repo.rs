use chrono::{DateTime, Utc};
use localreads_library::{BookId, Collection, CollectionId};
use serde::Serialize;
use sqlx::SqlitePool;

pub const MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS collections_name_unique ON collections (name COLLATE NOCASE);
CREATE TABLE IF NOT EXISTS book_collections (
    book_id       INTEGER NOT NULL REFERENCES books (id) ON DELETE CASCADE,
    collection_id INTEGER NOT NULL REFERENCES collections (id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, collection_id)
);
CREATE INDEX IF NOT EXISTS book_collections_collection ON book_collections (collection_id);
"#;

/// A collection with its member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CollectionSummary {
    pub id: CollectionId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub book_count: i64,
}

/// All collections ordered by name.
pub async fn list(pool: &SqlitePool) -> sqlx::Result<Vec<CollectionSummary>> {
    sqlx::query_as(
        "SELECT c.id, c.name, c.description, c.created_at, COUNT(bc.book_id) AS book_count \
         FROM collections c LEFT JOIN book_collections bc ON bc.collection_id = c.id \
         GROUP BY c.id ORDER BY c.name COLLATE NOCASE, c.id",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> sqlx::Result<Option<CollectionId>> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM collections WHERE name = ? COLLATE NOCASE")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(id,)| id))
}

/// Insert a collection; `name` must already be trimmed and non-empty.
pub async fn create(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
) -> sqlx::Result<Collection> {
    let created_at = Utc::now();
    let result =
        sqlx::query("INSERT INTO collections (name, description, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(description)
            .bind(created_at)
            .execute(pool)
            .await?;

    Ok(Collection {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        description: description.map(str::to_string),
        created_at,
    })
}

pub async fn exists(pool: &SqlitePool, id: CollectionId) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM collections WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Delete a collection. Memberships go with it; member books stay.
/// Returns whether a collection was deleted.
pub async fn delete(pool: &SqlitePool, id: CollectionId) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM collections WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Add a membership. Adding an existing membership is a no-op.
pub async fn add_book(
    pool: &SqlitePool,
    collection_id: CollectionId,
    book_id: BookId,
) -> sqlx::Result<()> {
    sqlx::query("INSERT OR IGNORE INTO book_collections (book_id, collection_id) VALUES (?, ?)")
        .bind(book_id)
        .bind(collection_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove a membership; returns whether one existed.
pub async fn remove_book(
    pool: &SqlitePool,
    collection_id: CollectionId,
    book_id: BookId,
) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM book_collections WHERE book_id = ? AND collection_id = ?")
        .bind(book_id)
        .bind(collection_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::repo::{self as books, tests::{new_book, test_pool}};

    #[tokio::test]
    async fn deleting_a_collection_keeps_its_books() {
        let (_dir, pool) = test_pool().await;
        let book = books::insert(&pool, &new_book("Kept", "/kept.epub")).await.unwrap();
        let shelf = create(&pool, "Favourites", None).await.unwrap();

        add_book(&pool, shelf.id, book.id).await.unwrap();
        add_book(&pool, shelf.id, book.id).await.unwrap();
        let stored = books::get(&pool, book.id).await.unwrap();
        assert_eq!(stored.collections.iter().copied().collect::<Vec<_>>(), [shelf.id]);
        assert_eq!(list(&pool).await.unwrap()[0].book_count, 1);

        assert!(delete(&pool, shelf.id).await.unwrap());
        let stored = books::get(&pool, book.id).await.unwrap();
        assert!(stored.collections.is_empty());
        assert!(!delete(&pool, shelf.id).await.unwrap());
    }

    #[tokio::test]
    async fn names_are_unique_ignoring_case() {
        let (_dir, pool) = test_pool().await;
        create(&pool, "Sci-Fi", Some("space")).await.unwrap();
        assert!(create(&pool, "sci-fi", None).await.is_err());
        assert!(find_by_name(&pool, "SCI-FI").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn remove_reports_missing_membership() {
        let (_dir, pool) = test_pool().await;
        let book = books::insert(&pool, &new_book("B", "")).await.unwrap();
        let shelf = create(&pool, "Shelf", None).await.unwrap();
        assert!(!remove_book(&pool, shelf.id, book.id).await.unwrap());
        add_book(&pool, shelf.id, book.id).await.unwrap();
        assert!(remove_book(&pool, shelf.id, book.id).await.unwrap());
    }
}

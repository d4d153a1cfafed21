//! SQLite pool factory and migration runner.

use std::str::FromStr;

use anyhow::Context;
use chrono::Utc;
use localreads_kernel::settings::DatabaseSettings;
use localreads_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Open (creating if needed) the database described by `settings`.
///
/// Foreign keys are enforced on every pooled connection.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database '{}'", settings.url))?;

    tracing::info!(target: "localreads-db", url = %settings.url, "database connected");
    Ok(pool)
}

/// Apply every migration not yet recorded in `schema_migrations`.
///
/// Migrations are keyed by `{module}:{id}` and applied in the given order,
/// each inside its own transaction. Returns how many were applied.
pub async fn apply_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            id TEXT PRIMARY KEY NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("failed to create schema_migrations")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let key = format!("{}:{}", module, migration.id);

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM schema_migrations WHERE id = ?")
                .bind(&key)
                .fetch_optional(pool)
                .await?;
        if existing.is_some() {
            continue;
        }

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration '{}' failed", key))?;
        sqlx::query("INSERT INTO schema_migrations (id, applied_at) VALUES (?, ?)")
            .bind(&key)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(target: "localreads-db", migration = %key, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &tempfile::TempDir) -> DatabaseSettings {
        DatabaseSettings {
            url: format!("sqlite:{}", dir.path().join("test.db").display()),
            max_connections: 2,
        }
    }

    fn migrations() -> Vec<(String, Migration)> {
        vec![
            (
                "books".to_string(),
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT);",
                },
            ),
            (
                "books".to_string(),
                Migration {
                    id: "002_isbn",
                    up: "ALTER TABLE books ADD COLUMN isbn TEXT;",
                },
            ),
        ]
    }

    #[tokio::test]
    async fn creates_missing_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        let pool = connect(&settings).await.unwrap();
        pool.close().await;
        assert!(dir.path().join("test.db").exists());
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let dir = tempfile::tempdir().unwrap();
        let pool = connect(&settings_in(&dir)).await.unwrap();

        assert_eq!(apply_migrations(&pool, &migrations()).await.unwrap(), 2);
        assert_eq!(apply_migrations(&pool, &migrations()).await.unwrap(), 0);

        sqlx::query("INSERT INTO books (title, isbn) VALUES ('Dune', '9780441013593')")
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let pool = connect(&settings_in(&dir)).await.unwrap();
        let broken = vec![(
            "books".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE nope (",
            },
        )];

        assert!(apply_migrations(&pool, &broken).await.is_err());
        let recorded: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(recorded.0, 0);
    }
}

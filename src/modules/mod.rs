pub mod books;
pub mod collections;
pub mod isbn;
pub mod scan;

use anyhow::Context;
use localreads_kernel::{settings::Settings, ModuleRegistry};
use sqlx::SqlitePool;

use isbn::client::OpenLibraryClient;

/// Register all application modules with the registry.
///
/// Registration order is migration order: `collections` references `books`.
pub fn register_all(
    registry: &mut ModuleRegistry,
    pool: &SqlitePool,
    settings: &Settings,
) -> anyhow::Result<()> {
    let client =
        OpenLibraryClient::new(&settings.isbn).context("failed to build Open Library client")?;

    registry.register(books::create_module(pool.clone()));
    registry.register(collections::create_module(pool.clone()));
    registry.register(scan::create_module(pool.clone(), settings.library.clone()));
    registry.register(isbn::create_module(client));
    Ok(())
}

/// A registry holding every application module.
pub fn build_registry(pool: &SqlitePool, settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    register_all(&mut registry, pool, settings)?;
    Ok(registry)
}

/// Apply every module's pending migrations.
pub async fn migrate(pool: &SqlitePool, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let applied = localreads_db::apply_migrations(pool, &registry.collect_migrations()).await?;
    tracing::info!(applied, "migrations up to date");
    Ok(applied)
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use axum::Router;
    use localreads_kernel::settings::{LibrarySettings, Settings};
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    /// The full HTTP stack over a migrated temporary database.
    pub(crate) struct TestApp {
        _dir: tempfile::TempDir,
        pub pool: SqlitePool,
        pub library: LibrarySettings,
        pub router: Router,
    }

    impl TestApp {
        pub(crate) async fn new() -> Self {
            let (dir, pool) = super::books::repo::tests::test_pool().await;
            let mut settings = Settings::default();
            settings.library.books_dir = dir.path().join("books");
            settings.library.covers_dir = dir.path().join("covers");

            let registry = super::build_registry(&pool, &settings).unwrap();
            let router = localreads_http::build_router(&registry, &settings);
            Self {
                _dir: dir,
                pool,
                library: settings.library,
                router,
            }
        }
    }

    pub(crate) async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        router.clone().oneshot(request).await.unwrap()
    }

    pub(crate) async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

use async_trait::async_trait;
use axum::Router;
use sqlx::SqlitePool;

use crate::settings::Settings;

/// What a module can reach while booting: configuration and the shared pool.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
    pub db: &'a SqlitePool,
}

/// One schema step. `id` is unique within its module and never reused.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A feature unit of the Localreads server.
///
/// Each module owns a slice of the API under `/api/{name}`, an OpenAPI
/// fragment describing it, and the tables it needs. Lifecycle order is
/// migrations, then `init`, then `start`; `stop` runs after the server
/// has drained.
#[async_trait]
pub trait Module: Sync + Send {
    /// Mount point and migration namespace.
    fn name(&self) -> &'static str;

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Paths are relative to `/api/{name}`.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Fragment with `paths` and `components`, merged into the served document.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Applied in the returned order, after every earlier-registered module's.
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

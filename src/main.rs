use anyhow::Context;
use localreads_kernel::{settings::Settings, InitCtx};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load Localreads settings")?;
    localreads_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        books_dir = %settings.library.books_dir.display(),
        "localreads bootstrap starting"
    );

    let pool = localreads_db::connect(&settings.database).await?;
    let registry = localreads_app::build_registry(&pool, &settings)?;
    localreads_app::migrate(&pool, &registry).await?;

    let ctx = InitCtx {
        settings: &settings,
        db: &pool,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = localreads_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    pool.close().await;
    tracing::info!("localreads shut down");
    served
}

use std::sync::Arc;

use cinelog::{
    config::{Config, StoreBackend},
    db::{create_pool, create_redis_client, Cache, ChangeFeed, MemoryStore, PgStore, Store},
    routes::{create_router, AppState},
    services::{GoTrueAuth, PosterUrls, SuggestionGenerator, TmdbCatalog},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinelog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_url).await?;
            tracing::info!("Connected to PostgreSQL");
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client);

    let catalog = TmdbCatalog::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    );
    let auth = GoTrueAuth::new(config.auth_url.clone(), config.auth_api_key.clone());

    let state = AppState {
        store,
        catalog: Arc::new(catalog),
        auth: Arc::new(auth),
        generator: Arc::new(SuggestionGenerator::from_config(&config)),
        posters: PosterUrls::new(config.tmdb_image_url.clone()),
        changes: ChangeFeed::new(),
        search_debounce: config.search_debounce(),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

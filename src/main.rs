use std::sync::Arc;

use movie_recommender::{
    config::Config,
    db::{self, Cache, MemoryStore, PgStore, RatingStore},
    routes::{create_router, AppState},
    services::RecommendationService,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_recommender=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn RatingStore> = if config.use_memory_store {
        tracing::warn!("Using the in-memory store, data is lost on shutdown");
        Arc::new(MemoryStore::new())
    } else {
        let pool = db::create_pool(&config.database_url).await?;
        Arc::new(PgStore::new(pool))
    };

    let mut recommender = RecommendationService::new(store.clone(), config.engine());
    let mut cache = None;
    let mut cache_writer = None;

    if let Some(redis_url) = &config.redis_url {
        let client = db::create_redis_client(redis_url)?;
        let (redis_cache, handle) = Cache::new(client).await;
        recommender = recommender.with_cache(redis_cache.clone(), config.cache_ttl_secs);
        cache = Some(redis_cache);
        cache_writer = Some(handle);
        tracing::info!(ttl = config.cache_ttl_secs, "Recommendation cache enabled");
    }

    let mut state = AppState::new(store.clone(), recommender);
    if let Some(cache) = cache {
        state = state.with_cache(cache);
    }

    tracing::info!(
        store = store.name(),
        engine = ?config.engine(),
        "Starting movie recommender"
    );

    let app = create_router(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

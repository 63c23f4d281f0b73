use std::sync::Arc;

use graphrec_api::{
    config::Config,
    db::{self, Cache, InMemoryRatingStore, PgRatingStore, RatingStore},
    engine::DatasetPaths,
    routes::{create_router, AppState},
    services::{OmdbPosterProvider, RecommendationOptions},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graphrec_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let rating_store: Arc<dyn RatingStore> = match &config.database_url {
        Some(url) => Arc::new(PgRatingStore::new(db::create_pool(url).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set, ratings are kept in memory");
            Arc::new(InMemoryRatingStore::new())
        }
    };

    let options = RecommendationOptions {
        strategy: config.recommendation_strategy,
        walk: config.random_walk(),
        ..RecommendationOptions::default()
    };
    let mut state = AppState::new(rating_store, DatasetPaths::from_dir(&config.data_dir))
        .with_recommendations(options);

    let mut cache_writer = None;
    if let Some(api_key) = &config.poster_api_key {
        let (cache, handle) = Cache::new(db::create_redis_client(&config.redis_url)?);
        cache_writer = Some(handle);
        state = state.with_posters(Arc::new(OmdbPosterProvider::new(
            cache,
            api_key.clone(),
            config.poster_api_url.clone(),
        )));
    } else {
        tracing::info!("POSTER_API_KEY not set, poster lookups disabled");
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        address = %addr,
        data_dir = %config.data_dir,
        strategy = ?config.recommendation_strategy,
        "Server listening"
    );

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

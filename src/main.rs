use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use procsight::analysis::{CrossLocationService, PatternEngine};
use procsight::cache::{Cache, RedisCache};
use procsight::config::AppConfig;
use procsight::db::{OrderHistoryRepo, PatternRepo, PriceSnapshotRepo, SpendAggregateRepo};
use procsight::events::BroadcastHub;
use procsight::jobs;
use procsight::providers::OrderHistory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "procsight=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = AppConfig::load()?;
    tracing::info!("Configuration loaded");

    // Connect to PostgreSQL
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url())
        .await?;
    tracing::info!("Connected to PostgreSQL");

    // Run migrations
    sqlx::raw_sql(include_str!("../migrations/001_initial_schema.sql"))
        .execute(&pool)
        .await?;
    tracing::info!("Database migrations applied");

    // Connect to Redis
    let cache: Arc<dyn Cache> = Arc::new(RedisCache::connect(&config.redis.url).await?);
    if !cache.ping().await {
        tracing::warn!("Cache did not answer ping at startup");
    }
    tracing::info!("Connected to Redis");

    // Wire providers and services
    let orders: Arc<dyn OrderHistory> = Arc::new(OrderHistoryRepo::new(pool.clone()));
    let patterns = Arc::new(PatternRepo::new(pool.clone()));
    let prices = Arc::new(PriceSnapshotRepo::new(pool.clone()));
    let spend = Arc::new(SpendAggregateRepo::new(pool.clone()));
    let hub = Arc::new(BroadcastHub::new());

    let engine = Arc::new(PatternEngine::new(
        orders.clone(),
        patterns,
        cache.clone(),
        hub.clone(),
        config.analysis.clone(),
        config.cache_ttl.clone(),
    ));
    let cross_location = Arc::new(CrossLocationService::new(
        prices,
        spend,
        cache,
        config.analysis.clone(),
        config.cache_ttl.clone(),
    ));

    // Spawn background jobs
    jobs::spawn_background_jobs(
        engine,
        cross_location,
        orders,
        config.jobs.clone(),
        config.analysis.active_window_days,
    );

    tracing::info!("Analytics engine running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}

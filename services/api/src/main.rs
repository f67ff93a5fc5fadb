use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod extractors;
mod middleware;
mod models;
mod repositories;
mod routes;
mod seed;
mod state;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, init_pool},
    error::DatabaseError,
    storage::{Storage, StorageConfig},
    token::{IdentityPoolConfig, RevocationList, TokenVerifier},
};

use crate::{
    config::AppConfig,
    repositories::{ListingRepository, UserRepository},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting API service");

    let app_config = AppConfig::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(DatabaseError::from)?;
    info!("Database migrations applied");

    let pool_config = IdentityPoolConfig::from_env()?;
    let verifier = TokenVerifier::fetch(&pool_config).await?;

    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;
    if !redis_pool.health_check().await? {
        anyhow::bail!("Failed to connect to Redis");
    }

    let storage = Storage::new(StorageConfig::from_env()).await;

    let app_state = AppState {
        users: UserRepository::new(pool.clone()),
        listings: ListingRepository::new(pool.clone()),
        db_pool: pool,
        storage,
        verifier,
        revocations: RevocationList::new(redis_pool),
        mortgage: app_config.mortgage.clone(),
    };

    info!(
        "API service initialized (market rate {}%, {} year term)",
        app_state.mortgage.market_rate, app_state.mortgage.term_years
    );

    let app = routes::create_router(app_state);

    let address = app_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

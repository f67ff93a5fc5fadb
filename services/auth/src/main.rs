use anyhow::Result;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod extractors;
mod identity;
mod middleware;
mod models;
mod rate_limiter;
mod routes;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    token::{IdentityPoolConfig, RevocationList, TokenVerifier},
};

use crate::{config::AppConfig, identity::IdentityClient, rate_limiter::RateLimiter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityClient,
    pub verifier: TokenVerifier,
    pub revocations: RevocationList,
    pub rate_limiter: RateLimiter,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting authentication service");

    let app_config = AppConfig::load()?;

    let pool_config = IdentityPoolConfig::from_env()?;
    let verifier = TokenVerifier::fetch(&pool_config).await?;
    let identity = IdentityClient::new(&pool_config);

    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;
    if !redis_pool.health_check().await? {
        anyhow::bail!("Failed to connect to Redis");
    }

    let rate_limiter = RateLimiter::new(app_config.sign_in_limit.clone());

    // Drop stale limiter entries
    let pruned = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(
            pruned.config().window_seconds.max(60),
        ));
        loop {
            interval.tick().await;
            pruned.prune().await;
        }
    });

    let app_state = AppState {
        identity,
        verifier,
        revocations: RevocationList::new(redis_pool),
        rate_limiter,
    };

    info!("Authentication service initialized successfully");

    let app = routes::create_router(app_state);

    let address = app_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Authentication service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Common library for the ValorHomes services
//!
//! This crate provides shared functionality used by the auth and API
//! services: PostgreSQL connectivity, the Redis cache backing the token
//! revocation list, identity-pool token verification, and presigned object
//! storage with its path-scoped access rules.

pub mod cache;
pub mod database;
pub mod error;
pub mod storage;
pub mod token;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, init_pool, health_check};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}

//! Application state shared across handlers

use common::{
    storage::Storage,
    token::{RevocationList, TokenVerifier},
};
use sqlx::PgPool;

use crate::{
    config::MortgageConfig,
    repositories::{ListingRepository, UserRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub users: UserRepository,
    pub listings: ListingRepository,
    pub storage: Storage,
    pub verifier: TokenVerifier,
    pub revocations: RevocationList,
    pub mortgage: MortgageConfig,
}

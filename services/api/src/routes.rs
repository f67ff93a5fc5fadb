//! API service routes

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{NaiveDate, Utc};
use common::{storage::Principal, token::AuthUser};
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{auth_middleware, optional_auth_middleware},
    models::user::User,
    state::AppState,
};

pub mod listings;
pub mod mortgage;
pub mod profile;
pub mod uploads;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/profile/initialize", post(profile::initialize_profile))
        .route("/profile/listings", get(profile::get_profile_listings))
        .route("/profile/photo", post(profile::create_photo_upload))
        .route("/users/:id", get(profile::get_public_profile))
        .route("/listings", post(listings::create_listing))
        .route(
            "/listings/:listing",
            put(listings::update_listing).delete(listings::delete_listing),
        )
        .route("/uploads", post(uploads::create_upload))
        .route("/seed", post(listings::seed))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let public_routes = Router::new()
        .route("/listings", get(listings::list_listings))
        .route("/listings/:listing", get(listings::get_listing))
        .route("/mortgage/quote", get(mortgage::get_quote))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "api-service",
        "database": database,
    }))
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) fn principal(user: Option<&AuthUser>) -> Principal<'_> {
    match user {
        Some(user) => Principal::User(&user.sub),
        None => Principal::Guest,
    }
}

/// The caller's profile, which most write operations need
pub(crate) async fn require_profile(state: &AppState, user: &AuthUser) -> ApiResult<User> {
    state.users.find_by_sub(&user.sub).await?.ok_or_else(|| {
        ApiError::NotFound(
            "Profile not set up. Please wait a moment and refresh the page.".to_string(),
        )
    })
}

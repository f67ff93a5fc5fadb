//! Profile routes

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use common::{storage::Principal, token::AuthUser};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extractors::{AppJson, AppPath},
    models::user::{
        InitializedProfile, NewProfile, PhotoUploadRequest, ProfileUpdate, ProfileView,
        PublicProfile, User,
    },
    routes::{listings::listing_card, require_profile},
    state::AppState,
};

async fn photo_url(state: &AppState, user: &User, principal: Principal<'_>) -> Option<String> {
    match &user.profile_photo_path {
        Some(path) => state.storage.resolve_image(path, principal).await,
        None => None,
    }
}

async fn profile_view(state: &AppState, user: User, caller: &AuthUser) -> ApiResult<ProfileView> {
    let photo_url = photo_url(state, &user, Principal::User(&caller.sub)).await;
    let active_listing_count = state.listings.count_active_by_user(user.id).await?;

    Ok(ProfileView {
        user,
        photo_url,
        active_listing_count,
    })
}

/// Create the caller's profile on first sign-in
pub async fn initialize_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let (profile, created) = state
        .users
        .create_if_missing(&NewProfile::from_identity(&user))
        .await?;

    if !profile.is_owned_by(&user) {
        return Err(ApiError::Conflict(
            "An account with this email already exists.".to_string(),
        ));
    }

    let status = if created {
        info!("Created profile {} for {}", profile.id, user.sub);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(InitializedProfile { created, profile })))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let profile = require_profile(&state, &user).await?;
    Ok(Json(profile_view(&state, profile, &user).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(payload): AppJson<ProfileUpdate>,
) -> ApiResult<impl IntoResponse> {
    let profile = require_profile(&state, &user).await?;
    let changes = payload.validate(&user.sub).map_err(ApiError::BadRequest)?;

    let updated = state
        .users
        .update_profile(profile.id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!("Updated profile {}", updated.id);
    Ok(Json(profile_view(&state, updated, &user).await?))
}

/// The caller's listings in every status
pub async fn get_profile_listings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let profile = require_profile(&state, &user).await?;
    let listings = state.listings.list_by_user(profile.id).await?;

    let principal = Principal::User(&user.sub);
    let mut cards = Vec::with_capacity(listings.len());
    for listing in listings {
        cards.push(listing_card(&state, listing, principal).await);
    }

    Ok(Json(cards))
}

/// Presign an upload of the caller's profile photo
pub async fn create_photo_upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(payload): AppJson<PhotoUploadRequest>,
) -> ApiResult<impl IntoResponse> {
    let path = payload
        .path_for(&user.sub)
        .map_err(ApiError::BadRequest)?;

    let presigned = state
        .storage
        .presign_put(&path, &payload.content_type, Principal::User(&user.sub))
        .await?;

    Ok(Json(presigned))
}

pub async fn get_public_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let photo_url = photo_url(&state, &user, Principal::User(&caller.sub)).await;
    let active_listing_count = state.listings.count_active_by_user(user.id).await?;

    Ok(Json(PublicProfile {
        id: user.id,
        is_own_profile: user.is_owned_by(&caller),
        first_name: user.first_name,
        last_name: user.last_name,
        member_since: user.created_at,
        photo_url,
        active_listing_count,
    }))
}

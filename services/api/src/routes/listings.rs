//! Listing routes

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use common::{storage::Principal, token::AuthUser};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extractors::{AppJson, AppPath, AppQuery},
    middleware::MaybeUser,
    models::{
        Page, Pagination,
        listing::{
            Listing, ListingCard, ListingDetail, ListingFields, ListingQuery, ListingUpdate,
            NewListing, PaymentDisplay, slug_candidate,
        },
        user::OwnerSummary,
    },
    repositories::ListingRepository,
    routes::{principal, require_profile, today},
    seed,
    state::AppState,
};

const MAX_SLUG_ATTEMPTS: u32 = 50;

fn listing_not_found() -> ApiError {
    ApiError::NotFound("Listing not found".to_string())
}

/// Card view with the primary image resolved and payments at the market rate
pub(crate) async fn listing_card(
    state: &AppState,
    listing: Listing,
    principal: Principal<'_>,
) -> ListingCard {
    let payments =
        listing.payment_comparison(state.mortgage.market_rate, state.mortgage.term_years);
    let display = PaymentDisplay::new(&listing, &payments);
    let image_url = state
        .storage
        .resolve_image(&listing.primary_image, principal)
        .await;

    ListingCard {
        listing,
        image_url,
        payments,
        display,
    }
}

/// Browse active listings
pub async fn list_listings(
    State(state): State<AppState>,
    Extension(MaybeUser(caller)): Extension<MaybeUser>,
    AppQuery(query): AppQuery<ListingQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = Pagination::new(query.page, query.limit);
    let filter = query.filter(today());

    let (listings, total) = state.listings.list_active(&filter, pagination).await?;

    let principal = principal(caller.as_ref());
    let mut items = Vec::with_capacity(listings.len());
    for listing in listings {
        items.push(listing_card(&state, listing, principal).await);
    }

    Ok(Json(Page {
        items,
        page: pagination.page,
        limit: pagination.limit,
        total,
    }))
}

/// One listing by slug with its full loan quote
pub async fn get_listing(
    State(state): State<AppState>,
    Extension(MaybeUser(caller)): Extension<MaybeUser>,
    AppPath(slug): AppPath<String>,
) -> ApiResult<impl IntoResponse> {
    let listing = state
        .listings
        .find_by_slug(&slug)
        .await?
        .ok_or_else(listing_not_found)?;

    let owner = state.users.find_by_id(listing.user_id).await?;
    if !listing.is_visible_to(owner.as_ref(), caller.as_ref()) {
        return Err(listing_not_found());
    }
    let is_owner = listing.is_owned_by(owner.as_ref(), caller.as_ref());

    let principal = principal(caller.as_ref());
    let primary_image_url = state
        .storage
        .resolve_image(&listing.primary_image, principal)
        .await;
    let mut image_urls = Vec::with_capacity(listing.images.len());
    for image in &listing.images {
        if let Some(url) = state.storage.resolve_image(image, principal).await {
            image_urls.push(url);
        }
    }

    let quote = listing.loan_quote(state.mortgage.market_rate, state.mortgage.term_years);
    let display = PaymentDisplay::new(&listing, &quote.comparison);
    let metadata = listing.metadata();

    Ok(Json(ListingDetail {
        owner: owner.as_ref().map(OwnerSummary::from),
        listing,
        primary_image_url,
        image_urls,
        quote,
        display,
        is_owner,
        metadata,
    }))
}

/// Insert with the first free slug derived from `base`
async fn create_with_unique_slug(
    listings: &ListingRepository,
    user_id: Uuid,
    base: &str,
    fields: &ListingFields,
) -> ApiResult<Listing> {
    for attempt in 0..MAX_SLUG_ATTEMPTS {
        let slug = slug_candidate(base, attempt);
        if listings.slug_exists(&slug).await? {
            continue;
        }

        match listings.create(user_id, &slug, fields).await {
            Ok(listing) => return Ok(listing),
            // Taken between the check and the insert
            Err(e) if e.is_unique_violation() => {
                warn!("Slug {} was taken concurrently", slug);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::Conflict(
        "Could not find a free address for this listing. Please choose a different title."
            .to_string(),
    ))
}

pub async fn create_listing(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(payload): AppJson<NewListing>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_profile(&state, &user).await?;

    let base = payload.slug_base();
    let fields = payload.into_fields(today()).map_err(ApiError::BadRequest)?;
    let listing = create_with_unique_slug(&state.listings, owner.id, &base, &fields).await?;

    info!("Created listing {} for {}", listing.slug, owner.id);
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Fetch a listing the caller owns
async fn owned_listing(state: &AppState, user: &AuthUser, id: Uuid) -> ApiResult<Listing> {
    let listing = state
        .listings
        .find_by_id(id)
        .await?
        .ok_or_else(listing_not_found)?;

    let caller = state.users.find_by_sub(&user.sub).await?;
    if listing.can_be_modified_by(caller.as_ref()) {
        Ok(listing)
    } else {
        Err(ApiError::Forbidden(
            "You can only change your own listings.".to_string(),
        ))
    }
}

pub async fn update_listing(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<ListingUpdate>,
) -> ApiResult<impl IntoResponse> {
    let listing = owned_listing(&state, &user, id).await?;

    let fields = payload
        .apply(listing.fields())
        .map_err(ApiError::BadRequest)?;
    let updated = state
        .listings
        .update(id, &fields)
        .await?
        .ok_or_else(listing_not_found)?;

    info!("Updated listing {}", updated.slug);
    Ok(Json(updated))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let listing = owned_listing(&state, &user, id).await?;

    if !state.listings.delete(id).await? {
        return Err(listing_not_found());
    }

    info!("Deleted listing {}", listing.slug);
    Ok(Json(json!({"message": "Listing deleted successfully"})))
}

/// Create the sample listings for the caller
pub async fn seed(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_profile(&state, &user).await?;
    let report = seed::seed_listings(&state.listings, owner.id, today()).await?;

    Ok((StatusCode::CREATED, Json(report)))
}

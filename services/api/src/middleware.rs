//! Authentication middleware for identity-pool ID tokens

use axum::{extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::token::{AuthUser, TokenError};
use tracing::{error, info};

use crate::{error::ApiError, state::AppState};

/// Caller on routes that work for guests and signed-in users alike
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let user = state.verifier.verify(token).map_err(|e| {
        info!("Rejected bearer token: {}", e);
        ApiError::Unauthorized
    })?;

    state
        .revocations
        .ensure_active(&user)
        .await
        .map_err(|e| match e {
            TokenError::Revoked => ApiError::Unauthorized,
            other => {
                error!("Failed to check revocation list: {}", other);
                ApiError::Internal(other.to_string())
            }
        })?;

    Ok(user)
}

/// Require a valid bearer ID token and expose the caller as an `AuthUser`
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;
    let user = authenticate(&state, bearer.token()).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Accept guests; a presented token must still be valid
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match bearer {
        Some(TypedHeader(Authorization(bearer))) => {
            Some(authenticate(&state, bearer.token()).await?)
        }
        None => None,
    };

    req.extensions_mut().insert(MaybeUser(user));

    Ok(next.run(req).await)
}

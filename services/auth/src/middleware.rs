//! Middleware for ID token validation

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::token::TokenError;
use tracing::{error, info};

use crate::{AppState, error::AuthError};

/// Verify the bearer ID token and expose the caller as an `AuthUser` extension
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::Unauthorized)?;

    let user = state.verifier.verify(bearer.token()).map_err(|e| {
        info!("Rejected bearer token: {}", e);
        AuthError::Unauthorized
    })?;

    state
        .revocations
        .ensure_active(&user)
        .await
        .map_err(|e| match e {
            TokenError::Revoked => AuthError::Unauthorized,
            other => {
                error!("Failed to check revocation list: {}", other);
                AuthError::Internal(other.to_string())
            }
        })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

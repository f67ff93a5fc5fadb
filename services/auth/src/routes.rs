//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use common::token::AuthUser;
use tracing::{error, info, warn};

use crate::{
    AppState,
    error::{AuthError, Flow, is_already_confirmed},
    extractors::AppJson,
    identity::{AuthOutcome, PoolErrorKind},
    middleware::auth_middleware,
    models::{
        MessageResponse, NextStep, RefreshTokenRequest, ResendCodeRequest, SignInRequest,
        SignInResponse, SignOutRequest, SignUpRequest, SignUpResponse, VerifyRequest,
    },
    validation,
};

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/verify", post(verify))
        .route("/auth/resend-code", post(resend_code))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/refresh", post(refresh_token))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

pub async fn sign_up(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignUpRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = validation::normalize_email(&payload.email);
    validation::validate_sign_up(
        &email,
        &payload.password,
        &payload.confirm_password,
        payload.agreed_to_terms,
    )
    .map_err(AuthError::Validation)?;

    let output = state
        .identity
        .sign_up(&email, &payload.password)
        .await
        .map_err(AuthError::identity(Flow::SignUp))?;

    let next_step = if output.user_confirmed {
        NextStep::Done
    } else {
        NextStep::ConfirmSignUp {
            delivery: output.code_delivery_details.map(Into::into),
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            user_sub: output.user_sub,
            next_step,
        }),
    ))
}

pub async fn verify(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = validation::normalize_email(&payload.email);
    let code = payload.code.trim();
    validation::validate_email(&email).map_err(AuthError::Validation)?;
    validation::validate_confirmation_code(code).map_err(AuthError::Validation)?;

    match state.identity.confirm_sign_up(&email, code).await {
        Ok(()) => info!("Confirmed account {}", email),
        Err(e) if is_already_confirmed(&e) => info!("Account {} was already confirmed", email),
        Err(e) => return Err(AuthError::identity(Flow::Verify)(e)),
    }

    Ok(Json(MessageResponse {
        message: "Email verified. You can now sign in.".to_string(),
        next_step: NextStep::SignIn,
    }))
}

pub async fn resend_code(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResendCodeRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = validation::normalize_email(&payload.email);
    validation::validate_email(&email).map_err(AuthError::Validation)?;

    let delivery = state
        .identity
        .resend_confirmation_code(&email)
        .await
        .map_err(AuthError::identity(Flow::ResendCode))?;

    Ok(Json(MessageResponse {
        message: "A new verification code has been sent to your email.".to_string(),
        next_step: NextStep::ConfirmSignUp {
            delivery: delivery.map(Into::into),
        },
    }))
}

pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignInRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = validation::normalize_email(&payload.email);
    validation::validate_email(&email).map_err(AuthError::Validation)?;
    if payload.password.is_empty() {
        return Err(AuthError::Validation("Password is required.".to_string()));
    }

    if !state.rate_limiter.is_allowed(&email).await {
        warn!("Sign-in rate limit hit for {}", email);
        return Err(AuthError::RateLimited);
    }

    let outcome = state
        .identity
        .sign_in(&email, &payload.password)
        .await
        .map_err(AuthError::identity(Flow::SignIn))?;

    let response = match outcome {
        AuthOutcome::Authenticated(result) => {
            state.rate_limiter.reset(&email).await;
            info!("Signed in {}", email);
            SignInResponse {
                tokens: Some(result.into()),
                next_step: NextStep::Done,
            }
        }
        AuthOutcome::Challenge { name, session } => {
            info!("Sign-in for {} requires challenge {}", email, name);
            SignInResponse {
                tokens: None,
                next_step: NextStep::Challenge { name, session },
            }
        }
    };

    Ok(Json(response))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.refresh_token.is_empty() {
        return Err(AuthError::Unauthorized);
    }

    let outcome = state
        .identity
        .refresh(&payload.refresh_token)
        .await
        .map_err(AuthError::identity(Flow::Refresh))?;

    match outcome {
        AuthOutcome::Authenticated(result) => Ok(Json(SignInResponse {
            tokens: Some(result.into()),
            next_step: NextStep::Done,
        })),
        AuthOutcome::Challenge { name, .. } => {
            error!("Unexpected challenge {} while refreshing", name);
            Err(AuthError::Internal(format!(
                "unexpected challenge {} on refresh",
                name
            )))
        }
    }
}

/// Sign out everywhere and revoke the presented ID token
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(payload): AppJson<SignOutRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Sign-out request for {}", user.sub);

    match state.identity.global_sign_out(&payload.access_token).await {
        Ok(()) => {}
        // An access token that is already invalid has nothing left to sign out
        Err(e) if e.kind() == Some(&PoolErrorKind::NotAuthorized) => {
            warn!("Access token already invalid for {}", user.sub);
        }
        Err(e) => return Err(AuthError::identity(Flow::SignOut)(e)),
    }

    state.revocations.revoke(&user).await.map_err(|e| {
        error!("Failed to revoke token: {}", e);
        AuthError::Internal(e.to_string())
    })?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Signed out successfully"})),
    ))
}

/// Identity of the current caller
pub async fn me(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(user)
}

//! Error responses of the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::identity::{IdentityError, PoolErrorKind};

/// Operation during which a pool error happened; picks the fallback wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    SignUp,
    SignIn,
    Verify,
    ResendCode,
    Refresh,
    SignOut,
}

impl Flow {
    fn fallback_message(self) -> &'static str {
        match self {
            Flow::SignUp => "An error occurred during sign-up. Please try again.",
            Flow::SignIn => "An error occurred during sign-in. Please try again.",
            Flow::Verify => "An error occurred during verification. Please try again.",
            Flow::ResendCode => "Failed to resend code. Please try again.",
            Flow::Refresh => "Your session has expired. Please sign in again.",
            Flow::SignOut => "An error occurred during sign-out. Please try again.",
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("identity pool error during {flow:?}: {source}")]
    Identity {
        flow: Flow,
        #[source]
        source: IdentityError,
    },

    #[error("too many sign-in attempts")]
    RateLimited,

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn identity(flow: Flow) -> impl FnOnce(IdentityError) -> AuthError {
        move |source| AuthError::Identity { flow, source }
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AuthError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AuthError::Identity { flow, source } => {
                let (status, message) = map_pool_error(source.kind(), *flow);
                (status, message.to_string())
            }
            AuthError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts. Please wait a moment and try again.".to_string(),
            ),
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AuthError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

/// ConfirmSignUp answers NotAuthorized for an account that is already confirmed
pub fn is_already_confirmed(error: &IdentityError) -> bool {
    matches!(error.kind(), Some(PoolErrorKind::NotAuthorized))
}

/// Translate a pool error into a status and user-facing message
pub fn map_pool_error(kind: Option<&PoolErrorKind>, flow: Flow) -> (StatusCode, &'static str) {
    match kind {
        Some(PoolErrorKind::NotAuthorized) if flow == Flow::Refresh => {
            (StatusCode::UNAUTHORIZED, flow.fallback_message())
        }
        Some(PoolErrorKind::NotAuthorized) => (
            StatusCode::UNAUTHORIZED,
            "Incorrect email or password. Please try again.",
        ),
        Some(PoolErrorKind::UserNotConfirmed) => (
            StatusCode::FORBIDDEN,
            "Please verify your email address before signing in.",
        ),
        Some(PoolErrorKind::UserNotFound) => (
            StatusCode::NOT_FOUND,
            "No account found with this email address.",
        ),
        Some(PoolErrorKind::UsernameExists) => (
            StatusCode::CONFLICT,
            "An account with this email already exists.",
        ),
        Some(PoolErrorKind::InvalidPassword) => (
            StatusCode::BAD_REQUEST,
            "Password does not meet requirements. Must be at least 8 characters with uppercase, lowercase, numbers, and symbols.",
        ),
        Some(PoolErrorKind::InvalidParameter) => {
            (StatusCode::BAD_REQUEST, "Invalid email or password format.")
        }
        Some(PoolErrorKind::CodeMismatch) => (
            StatusCode::BAD_REQUEST,
            "Invalid verification code. Please check and try again.",
        ),
        Some(PoolErrorKind::ExpiredCode) => (
            StatusCode::BAD_REQUEST,
            "Verification code has expired. Please request a new code.",
        ),
        Some(PoolErrorKind::TooManyRequests) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many attempts. Please wait a moment and try again.",
        ),
        Some(PoolErrorKind::Other(_)) | None => {
            (StatusCode::INTERNAL_SERVER_ERROR, flow.fallback_message())
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("{}", self);
        }

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_error(kind: PoolErrorKind) -> IdentityError {
        IdentityError::Pool {
            kind,
            message: String::new(),
        }
    }

    #[test]
    fn test_already_confirmed_on_verify() {
        assert!(is_already_confirmed(&pool_error(PoolErrorKind::NotAuthorized)));
        assert!(!is_already_confirmed(&pool_error(PoolErrorKind::CodeMismatch)));
        assert!(!is_already_confirmed(&pool_error(PoolErrorKind::ExpiredCode)));
        assert!(!is_already_confirmed(&IdentityError::UnexpectedResponse(
            "empty body".to_string()
        )));
    }

    #[test]
    fn test_known_pool_errors() {
        let cases = [
            (PoolErrorKind::NotAuthorized, StatusCode::UNAUTHORIZED),
            (PoolErrorKind::UserNotConfirmed, StatusCode::FORBIDDEN),
            (PoolErrorKind::UserNotFound, StatusCode::NOT_FOUND),
            (PoolErrorKind::UsernameExists, StatusCode::CONFLICT),
            (PoolErrorKind::InvalidPassword, StatusCode::BAD_REQUEST),
            (PoolErrorKind::InvalidParameter, StatusCode::BAD_REQUEST),
            (PoolErrorKind::CodeMismatch, StatusCode::BAD_REQUEST),
            (PoolErrorKind::ExpiredCode, StatusCode::BAD_REQUEST),
            (PoolErrorKind::TooManyRequests, StatusCode::TOO_MANY_REQUESTS),
        ];

        for (kind, expected) in cases {
            let (status, _) = map_pool_error(Some(&kind), Flow::SignIn);
            assert_eq!(status, expected, "{kind:?}");
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            map_pool_error(Some(&PoolErrorKind::NotAuthorized), Flow::SignIn).1,
            "Incorrect email or password. Please try again."
        );
        assert_eq!(
            map_pool_error(Some(&PoolErrorKind::UsernameExists), Flow::SignUp).1,
            "An account with this email already exists."
        );
        assert_eq!(
            map_pool_error(Some(&PoolErrorKind::ExpiredCode), Flow::Verify).1,
            "Verification code has expired. Please request a new code."
        );
    }

    #[test]
    fn test_unknown_error_uses_flow_fallback() {
        let other = PoolErrorKind::Other("InternalErrorException".to_string());
        assert_eq!(
            map_pool_error(Some(&other), Flow::SignUp),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred during sign-up. Please try again."
            )
        );
        assert_eq!(
            map_pool_error(None, Flow::ResendCode).1,
            "Failed to resend code. Please try again."
        );
        assert_eq!(
            map_pool_error(None, Flow::Verify).1,
            "An error occurred during verification. Please try again."
        );
    }

    #[test]
    fn test_refresh_rejection_asks_to_sign_in() {
        assert_eq!(
            map_pool_error(Some(&PoolErrorKind::NotAuthorized), Flow::Refresh),
            (
                StatusCode::UNAUTHORIZED,
                "Your session has expired. Please sign in again."
            )
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = AuthError::identity(Flow::SignIn)(pool_error(
            PoolErrorKind::UserNotConfirmed,
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = AuthError::Validation("Passwords do not match.".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(
            AuthError::RateLimited.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}

//! JSON bodies whose rejections render as `{"error": ..}`

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AuthError;

/// `Json<T>` with [`AuthError`] rejections
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            if e.status().is_server_error() {
                AuthError::Internal(e.body_text())
            } else {
                AuthError::Validation(e.body_text())
            }
        })?;
        Ok(AppJson(value))
    }
}

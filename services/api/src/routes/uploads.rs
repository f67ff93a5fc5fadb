//! Presigned uploads

use axum::{Extension, Json, extract::State, response::IntoResponse};
use common::{storage::Principal, token::AuthUser};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    extractors::AppJson,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub path: String,
    pub content_type: String,
}

/// Presign a direct upload after the path-scoped access check
pub async fn create_upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    AppJson(payload): AppJson<UploadRequest>,
) -> ApiResult<impl IntoResponse> {
    let content_type = payload.content_type.trim();
    if content_type.is_empty() {
        return Err(ApiError::BadRequest("A content type is required.".to_string()));
    }

    let presigned = state
        .storage
        .presign_put(payload.path.trim(), content_type, Principal::User(&user.sub))
        .await?;

    info!("Presigned upload of {} for {}", presigned.path, user.sub);
    Ok(Json(presigned))
}

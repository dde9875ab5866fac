use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::{extractors::CurrentAccount, model::Account};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::ext_from_mime;

/// POST /upload/avatar, multipart field `image`. Unlike the inline avatar
/// at registration this is the user's explicit intent, so failures are
/// surfaced instead of degraded.
#[instrument(skip(state, account, mp))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    mut mp: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut image = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("image") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("unreadable upload: {e}")))?;
            image = Some((data, content_type));
            break;
        }
    }

    let (bytes, content_type) =
        image.ok_or_else(|| ApiError::Validation("No file uploaded".into()))?;
    let ext = ext_from_mime(&content_type)
        .ok_or_else(|| ApiError::Validation("Unsupported image type".into()))?;

    let key = format!("avatars/{}/{}.{}", account.id, Uuid::new_v4(), ext);
    state
        .storage
        .put_object(&key, bytes, &content_type)
        .await
        .map_err(ApiError::Internal)?;
    let url = state.storage.object_url(&key);

    Account::set_avatar(&state.db, account.id, &url)
        .await
        .map_err(ApiError::Internal)?;

    info!(account_id = %account.id, "avatar updated");
    Ok(Json(json!({ "url": url, "message": "Profile picture updated" })))
}

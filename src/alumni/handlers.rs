use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::alumni::dto::{AlumniDetails, AlumniProfile, ProfileUpdate};
use crate::auth::{dto::PublicAccount, extractors::CurrentAccount, model::Account};
use crate::error::ApiError;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_directory(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicAccount>>, ApiError> {
    let accounts = Account::list_all(&state.db)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_alumni(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlumniDetails>, ApiError> {
    let account = Account::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Alumni not found"))?;
    let profile = AlumniProfile::find_by_account(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(AlumniDetails {
        user: account.into(),
        profile,
    }))
}

#[instrument(skip(state, account, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<AlumniProfile>, ApiError> {
    let profile = AlumniProfile::upsert(&state.db, account.id, &payload)
        .await
        .map_err(ApiError::Internal)?;
    info!(account_id = %account.id, "profile updated");
    Ok(Json(profile))
}

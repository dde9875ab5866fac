use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::{dto::PublicAccount, extractors::AdminAccount, model::Account};
use crate::error::ApiError;
use crate::state::AppState;

#[instrument(skip(state, _admin))]
pub async fn list_unverified(
    State(state): State<AppState>,
    _admin: AdminAccount,
) -> Result<Json<Vec<PublicAccount>>, ApiError> {
    let pending = Account::list_pending(&state.db)
        .await
        .map_err(ApiError::Internal)?;
    // The query already excludes admins; the standing check keeps the
    // state machine authoritative over the raw flags.
    Ok(Json(
        pending
            .into_iter()
            .filter(|a| a.standing().is_pending())
            .map(Into::into)
            .collect(),
    ))
}

/// Approve a pending account: verification flag and alumni role change
/// together, never independently.
#[instrument(skip(state, admin))]
pub async fn verify_account(
    State(state): State<AppState>,
    admin: AdminAccount,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let account = Account::approve(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("User not found"))?;

    info!(account_id = %account.id, approved_by = %admin.0.id, "account verified and promoted to alumni");
    Ok(Json(json!({
        "message": "User verified and upgraded to alumni",
        "user": PublicAccount::from(account),
    })))
}

#[instrument(skip(state, _admin))]
pub async fn list_premium(
    State(state): State<AppState>,
    _admin: AdminAccount,
) -> Result<Json<Vec<PublicAccount>>, ApiError> {
    let members = Account::list_premium(&state.db)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

/// Terminal state for any account: the row and its dependent alumni
/// profile go away together. Previously issued tokens die at the next
/// authenticated request, when the account lookup comes up empty.
#[instrument(skip(state, admin))]
pub async fn delete_account(
    State(state): State<AppState>,
    admin: AdminAccount,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let deleted = Account::delete(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    if !deleted {
        return Err(ApiError::NotFound("User not found"));
    }
    info!(account_id = %id, deleted_by = %admin.0.id, "account deleted");
    Ok(Json(json!({ "message": "User deleted" })))
}

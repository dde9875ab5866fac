use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::{
    dto::{AuthResponse, LoginRequest, PublicAccount, RegisterRequest},
    extractors::CurrentAccount,
    jwt::JwtKeys,
    model::Account,
    password::{hash_password, verify_password},
};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::ext_from_mime;

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let registration = payload.normalize(state.config.admin_secret.as_deref())?;
    let fields = registration.fields();

    // Fast-path duplicate check; the insert below still catches the race.
    if Account::find_by_email(&state.db, &fields.email)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        warn!(email = %fields.email, "registration for existing email");
        return Err(ApiError::Duplicate("Email already registered".into()));
    }

    // Avatar upload is best-effort: any failure falls back to the
    // placeholder and the account is still created.
    let avatar_url = match payload.avatar() {
        Some(Ok((bytes, content_type))) => {
            let ext = ext_from_mime(&content_type).unwrap_or("bin");
            let key = format!("avatars/{}.{}", Uuid::new_v4(), ext);
            match state.storage.put_object(&key, bytes, &content_type).await {
                Ok(()) => Some(state.storage.object_url(&key)),
                Err(e) => {
                    warn!(error = %e, "avatar upload failed, using placeholder");
                    None
                }
            }
        }
        Some(Err(e)) => {
            warn!(error = %e, "avatar decode failed, using placeholder");
            None
        }
        None => None,
    };

    // Hashing is CPU-bound; keep it off the request-dispatch threads.
    let plain = fields.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .map_err(ApiError::Internal)?;

    let account =
        Account::create(&state.db, fields, &hash, registration.standing(), avatar_url).await?;

    let token = JwtKeys::from_ref(&state)
        .sign(account.id, account.role)
        .map_err(ApiError::Internal)?;

    info!(account_id = %account.id, email = %account.email, role = ?account.role, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: account.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password share one error so login leaks
    // nothing about which was wrong.
    let account = Account::find_by_email(&state.db, &email)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::InvalidCredentials)?;

    let plain = payload.password;
    let stored = account.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &stored))
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .map_err(ApiError::Internal)?;

    if !ok {
        warn!(account_id = %account.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(&state)
        .sign(account.id, account.role)
        .map_err(ApiError::Internal)?;

    info!(account_id = %account.id, "logged in");
    Ok(Json(AuthResponse {
        token,
        user: account.into(),
    }))
}

#[instrument(skip_all)]
pub async fn me(CurrentAccount(account): CurrentAccount) -> Json<PublicAccount> {
    Json(account.into())
}

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::auth::jwt::JwtKeys;
use crate::auth::model::{Account, Role};
use crate::error::ApiError;
use crate::state::AppState;

/// Authentication: a valid bearer token whose subject still exists. The
/// loaded account is attached for downstream handlers, so a token for a
/// deleted account is rejected here and not one request later.
#[derive(Debug)]
pub struct CurrentAccount(pub Account);

/// Authorization on top of authentication: the account must be an admin.
pub struct AdminAccount(pub Account);

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated("Missing Authorization header"))?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or(ApiError::Unauthenticated("Invalid Authorization header"))
}

fn ensure_admin(account: &Account) -> Result<(), ApiError> {
    if account.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = JwtKeys::from_ref(state)
            .verify(token)
            .map_err(|_| ApiError::Unauthenticated("Invalid or expired token"))?;

        let account = Account::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::Internal)?
            .ok_or(ApiError::Unauthenticated("Account no longer exists"))?;

        Ok(CurrentAccount(account))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAccount {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Authenticate first, then gate on role.
        let CurrentAccount(account) = CurrentAccount::from_request_parts(parts, state).await?;
        ensure_admin(&account)?;
        Ok(AdminAccount(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::model::{Membership, PLACEHOLDER_AVATAR};
    use axum::http::Request;
    use jsonwebtoken::{DecodingKey, EncodingKey};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/auth/me");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn account_with_role(role: Role) -> Account {
        Account {
            id: Uuid::new_v4(),
            first_name: "Alice".into(),
            last_name: "Sen".into(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
            registration_number: "REG-1".into(),
            mobile_number: "9876543210".into(),
            gender: "Female".into(),
            batch: "2020".into(),
            department: "CSE".into(),
            avatar_url: PLACEHOLDER_AVATAR.into(),
            role,
            is_verified: false,
            membership: Membership::Free,
            membership_expiry: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn bearer_token_requires_header_and_scheme() {
        let parts = parts_with_auth(None);
        assert!(matches!(
            bearer_token(&parts),
            Err(ApiError::Unauthenticated(_))
        ));

        let parts = parts_with_auth(Some("Basic abc123"));
        assert!(matches!(
            bearer_token(&parts),
            Err(ApiError::Unauthenticated(_))
        ));

        let parts = parts_with_auth(Some("Bearer tok"));
        assert_eq!(bearer_token(&parts).unwrap(), "tok");
    }

    #[test]
    fn admin_gate_passes_admin_and_rejects_the_rest() {
        assert!(ensure_admin(&account_with_role(Role::Admin)).is_ok());
        for role in [Role::Standard, Role::Alumni] {
            assert!(matches!(
                ensure_admin(&account_with_role(role)),
                Err(ApiError::Forbidden)
            ));
        }
    }

    // The garbage/wrong-secret cases fail at token verification, before any
    // database access, so the fake state's lazy pool is never touched.
    #[tokio::test]
    async fn current_account_rejects_missing_and_malformed_tokens() {
        let state = AppState::fake();

        let mut parts = parts_with_auth(None);
        let err = CurrentAccount::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));

        let mut parts = parts_with_auth(Some("Bearer definitely.not.a.jwt"));
        let err = CurrentAccount::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn current_account_rejects_token_signed_with_other_secret() {
        let state = AppState::fake();
        let foreign = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            ttl: std::time::Duration::from_secs(3600),
        };
        let token = foreign.sign(Uuid::new_v4(), Role::Admin).unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let err = CurrentAccount::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::dto::RegistrationFields;
use crate::auth::model::{Account, Standing, PLACEHOLDER_AVATAR};
use crate::error::ApiError;

const ACCOUNT_COLS: &str = "id, first_name, last_name, email, password_hash, \
     registration_number, mobile_number, gender, batch, department, avatar_url, \
     role, is_verified, membership, membership_expiry, created_at";

/// Map a unique-constraint violation to the user-facing duplicate message.
/// Anything else stays an internal error.
fn translate_duplicate(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let msg = match db_err.constraint() {
                Some("accounts_registration_number_key") => {
                    "Registration number already registered"
                }
                _ => "Email already registered",
            };
            return ApiError::Duplicate(msg.into());
        }
    }
    ApiError::Internal(e.into())
}

impl Account {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(account)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(account)
    }

    /// Insert a new account. Uniqueness of email and registration number is
    /// enforced by the store; concurrent registrations race to this insert
    /// and the loser gets a duplicate error, never a crash.
    pub async fn create(
        db: &PgPool,
        fields: &RegistrationFields,
        password_hash: &str,
        standing: Standing,
        avatar_url: Option<String>,
    ) -> Result<Account, ApiError> {
        let (role, is_verified) = standing.into_flags();
        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts \
                 (first_name, last_name, email, password_hash, registration_number, \
                  mobile_number, gender, batch, department, avatar_url, role, is_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {ACCOUNT_COLS}"
        ))
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(password_hash)
        .bind(&fields.registration_number)
        .bind(&fields.mobile_number)
        .bind(&fields.gender)
        .bind(&fields.batch)
        .bind(&fields.department)
        .bind(avatar_url.unwrap_or_else(|| PLACEHOLDER_AVATAR.into()))
        .bind(role)
        .bind(is_verified)
        .fetch_one(db)
        .await
        .map_err(translate_duplicate)?;
        Ok(account)
    }

    /// Pending -> Approved: verification flag and alumni role flip in one
    /// statement. Admins are excluded so this can never demote one.
    pub async fn approve(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET is_verified = TRUE, role = 'alumni' \
             WHERE id = $1 AND role <> 'admin' \
             RETURNING {ACCOUNT_COLS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(account)
    }

    /// Accounts awaiting admin review. Role is filtered alongside the flag
    /// so an admin with a stale verification flag never shows up here.
    pub async fn list_pending(db: &PgPool) -> anyhow::Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts \
             WHERE is_verified = FALSE AND role <> 'admin' \
             ORDER BY created_at ASC"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_premium(db: &PgPool) -> anyhow::Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts \
             WHERE membership = 'premium' \
             ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Remove the account and its dependent alumni profile in one
    /// transaction. Returns false when the id matched nothing.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM alumni_profiles WHERE account_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_avatar(db: &PgPool, id: Uuid, url: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE accounts SET avatar_url = $1 WHERE id = $2")
            .bind(url)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

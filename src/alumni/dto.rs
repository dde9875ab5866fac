use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::PublicAccount;

/// Extension record the owning user maintains on top of their account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AlumniProfile {
    pub account_id: Uuid,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub skills: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub company: Option<String>,
    pub skills: Option<Vec<String>>,
}

/// Directory detail view: the sanitized account plus the optional profile
/// extension.
#[derive(Debug, Serialize)]
pub struct AlumniDetails {
    pub user: PublicAccount,
    pub profile: Option<AlumniProfile>,
}

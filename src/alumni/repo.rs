use sqlx::PgPool;
use uuid::Uuid;

use crate::alumni::dto::{AlumniProfile, ProfileUpdate};

impl AlumniProfile {
    pub async fn find_by_account(
        db: &PgPool,
        account_id: Uuid,
    ) -> anyhow::Result<Option<AlumniProfile>> {
        let profile = sqlx::query_as::<_, AlumniProfile>(
            "SELECT account_id, bio, company, skills, updated_at \
             FROM alumni_profiles WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    /// Insert-or-update keyed by the account. Absent fields keep their
    /// stored values, so a partial update never blanks the rest.
    pub async fn upsert(
        db: &PgPool,
        account_id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<AlumniProfile> {
        let profile = sqlx::query_as::<_, AlumniProfile>(
            "INSERT INTO alumni_profiles (account_id, bio, company, skills, updated_at) \
             VALUES ($1, $2, $3, COALESCE($4, '{}'::text[]), now()) \
             ON CONFLICT (account_id) DO UPDATE SET \
                 bio = COALESCE($2, alumni_profiles.bio), \
                 company = COALESCE($3, alumni_profiles.company), \
                 skills = COALESCE($4, alumni_profiles.skills), \
                 updated_at = now() \
             RETURNING account_id, bio, company, skills, updated_at",
        )
        .bind(account_id)
        .bind(&update.bio)
        .bind(&update.company)
        .bind(&update.skills)
        .fetch_one(db)
        .await?;
        Ok(profile)
    }
}

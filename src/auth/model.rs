use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Default avatar shown until the user uploads their own picture.
pub const PLACEHOLDER_AVATAR: &str =
    "https://icon-library.com/images/anonymous-avatar-icon/anonymous-avatar-icon-25.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Alumni,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Free,
    Premium,
}

/// The (role, is_verified) pair collapsed into the states the lifecycle
/// actually allows. Admin approval is the only Pending -> Approved edge and
/// flips both underlying fields in one update; the bootstrap state is only
/// reachable at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Pending { role: Role },
    Approved,
    AdminBootstrapped,
}

impl Standing {
    /// Classify a stored (role, is_verified) pair. Admin wins over the
    /// verification flag so a promoted admin can never read as pending.
    pub fn from_flags(role: Role, is_verified: bool) -> Self {
        match (role, is_verified) {
            (Role::Admin, _) => Standing::AdminBootstrapped,
            (role, false) => Standing::Pending { role },
            (_, true) => Standing::Approved,
        }
    }

    pub fn into_flags(self) -> (Role, bool) {
        match self {
            Standing::Pending { role } => (role, false),
            Standing::Approved => (Role::Alumni, true),
            Standing::AdminBootstrapped => (Role::Admin, true),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Standing::Pending { .. })
    }
}

/// Full account row. The password hash never leaves the process: it is
/// skipped on serialization and excluded from the public projection.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub registration_number: String,
    pub mobile_number: String,
    pub gender: String,
    pub batch: String,
    pub department: String,
    pub avatar_url: String,
    pub role: Role,
    pub is_verified: bool,
    pub membership: Membership,
    pub membership_expiry: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl Account {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn standing(&self) -> Standing {
        Standing::from_flags(self.role, self.is_verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_registration_is_pending() {
        let s = Standing::from_flags(Role::Standard, false);
        assert_eq!(
            s,
            Standing::Pending {
                role: Role::Standard
            }
        );
        assert!(s.is_pending());
    }

    #[test]
    fn approval_sets_role_and_flag_together() {
        let (role, verified) = Standing::Approved.into_flags();
        assert_eq!(role, Role::Alumni);
        assert!(verified);
    }

    #[test]
    fn admin_never_classifies_as_pending() {
        // Even with a stale verification flag a promoted admin must not
        // show up in the pending queue.
        assert!(!Standing::from_flags(Role::Admin, false).is_pending());
        assert!(!Standing::from_flags(Role::Admin, true).is_pending());
    }

    #[test]
    fn bootstrap_flags_are_admin_and_verified() {
        let (role, verified) = Standing::AdminBootstrapped.into_flags();
        assert_eq!(role, Role::Admin);
        assert!(verified);
    }

    #[test]
    fn flags_round_trip_through_standing() {
        for s in [
            Standing::Pending {
                role: Role::Standard,
            },
            Standing::Pending { role: Role::Alumni },
            Standing::Approved,
            Standing::AdminBootstrapped,
        ] {
            let (role, verified) = s.into_flags();
            assert_eq!(Standing::from_flags(role, verified), s);
        }
    }
}

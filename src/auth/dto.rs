use std::fmt;

use base64::Engine;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::model::{Account, Membership, Role, Standing};
use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Raw registration payload. Every field is optional at the wire level so
/// validation can report the full list of missing fields instead of a
/// deserializer error naming only the first one.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub registration_number: Option<String>,
    pub mobile_number: Option<String>,
    pub gender: Option<String>,
    pub department: Option<String>,
    pub batch: Option<String>,
    pub avatar_b64: Option<String>,
    pub avatar_content_type: Option<String>,
    pub admin_secret: Option<String>,
}

// Hand-written so the password and bootstrap secret can never reach a log
// line through tracing's field capture.
impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("registration_number", &self.registration_number)
            .field("mobile_number", &self.mobile_number)
            .field("gender", &self.gender)
            .field("department", &self.department)
            .field("batch", &self.batch)
            .field("avatar_b64", &self.avatar_b64.as_ref().map(|b| b.len()))
            .field("avatar_content_type", &self.avatar_content_type)
            .field("admin_secret", &"<redacted>")
            .finish()
    }
}

/// Validated registration, ready for one canonical account-construction
/// step. The two variants differ only in how the fields were obtained and
/// which standing the new account starts in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Student(RegistrationFields),
    AdminBootstrap(RegistrationFields),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub registration_number: String,
    pub mobile_number: String,
    pub gender: String,
    pub department: String,
    pub batch: String,
}

impl Registration {
    pub fn fields(&self) -> &RegistrationFields {
        match self {
            Registration::Student(f) | Registration::AdminBootstrap(f) => f,
        }
    }

    pub fn standing(&self) -> Standing {
        match self {
            Registration::Student(_) => Standing::Pending {
                role: Role::Standard,
            },
            Registration::AdminBootstrap(_) => Standing::AdminBootstrapped,
        }
    }
}

impl RegisterRequest {
    /// Normalize into a validated [`Registration`]. A bootstrap secret that
    /// exactly matches the configured one selects the admin path and
    /// back-fills any missing student-only fields with deterministic
    /// placeholders; an absent or wrong secret leaves the payload on the
    /// ordinary student path where those fields are required.
    pub fn normalize(&self, configured_admin_secret: Option<&str>) -> Result<Registration, ApiError> {
        let email = self
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        let bootstrap = match (self.admin_secret.as_deref(), configured_admin_secret) {
            (Some(given), Some(expected)) => given == expected,
            _ => false,
        };

        let mut missing: Vec<&str> = Vec::new();
        if email.is_none() {
            missing.push("email");
        }
        if self.password.as_deref().map_or(true, str::is_empty) {
            missing.push("password");
        }
        if self.first_name.as_deref().map_or(true, str::is_empty) {
            missing.push("first_name");
        }
        if self.last_name.as_deref().map_or(true, str::is_empty) {
            missing.push("last_name");
        }
        if !bootstrap {
            for (name, value) in [
                ("registration_number", &self.registration_number),
                ("mobile_number", &self.mobile_number),
                ("gender", &self.gender),
                ("department", &self.department),
                ("batch", &self.batch),
            ] {
                if value.as_deref().map_or(true, str::is_empty) {
                    missing.push(name);
                }
            }
        }
        if !missing.is_empty() {
            return Err(ApiError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let email = email.expect("presence checked above");
        if !is_valid_email(&email) {
            return Err(ApiError::Validation("Invalid email".into()));
        }
        let password = self.password.clone().expect("presence checked above");
        if password.len() < 6 {
            return Err(ApiError::Validation(
                "Password must be at least 6 characters".into(),
            ));
        }

        fn provided(v: &Option<String>) -> Option<String> {
            v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned)
        }

        // Placeholder registration number is derived from the (unique)
        // email so the registration-number uniqueness constraint holds.
        let registration_number =
            provided(&self.registration_number).unwrap_or_else(|| format!("ADM-{}", email));

        let fields = RegistrationFields {
            first_name: self.first_name.clone().expect("presence checked above"),
            last_name: self.last_name.clone().expect("presence checked above"),
            registration_number,
            mobile_number: provided(&self.mobile_number).unwrap_or_else(|| "0000000000".into()),
            gender: provided(&self.gender).unwrap_or_else(|| "Other".into()),
            department: provided(&self.department).unwrap_or_else(|| "Administration".into()),
            batch: provided(&self.batch).unwrap_or_else(|| "N/A".into()),
            email,
            password,
        };

        Ok(if bootstrap {
            Registration::AdminBootstrap(fields)
        } else {
            Registration::Student(fields)
        })
    }

    /// Decode the optional inline avatar. Errors here are the caller's to
    /// degrade; registration never fails over an avatar.
    pub fn avatar(&self) -> Option<anyhow::Result<(Bytes, String)>> {
        let b64 = self.avatar_b64.as_deref()?;
        let content_type = self
            .avatar_content_type
            .clone()
            .unwrap_or_else(|| "image/jpeg".into());
        Some(
            base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map(|bytes| (Bytes::from(bytes), content_type))
                .map_err(|e| anyhow::anyhow!("invalid avatar base64: {e}")),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sanitized account projection returned to clients. Built only from an
/// [`Account`], so the hash cannot leak by construction.
#[derive(Debug, Clone, Serialize)]
pub struct PublicAccount {
    pub id: Uuid,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub membership: Membership,
    #[serde(with = "time::serde::rfc3339::option")]
    pub membership_expiry: Option<OffsetDateTime>,
    pub avatar_url: String,
    pub registration_number: String,
    pub mobile_number: String,
    pub gender: String,
    pub department: String,
    pub batch: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Account> for PublicAccount {
    fn from(a: Account) -> Self {
        Self {
            name: a.display_name(),
            id: a.id,
            first_name: a.first_name,
            last_name: a.last_name,
            email: a.email,
            role: a.role,
            is_verified: a.is_verified,
            membership: a.membership,
            membership_expiry: a.membership_expiry,
            avatar_url: a.avatar_url,
            registration_number: a.registration_number,
            mobile_number: a.mobile_number,
            gender: a.gender,
            department: a.department,
            batch: a.batch,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicAccount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::model::PLACEHOLDER_AVATAR;

    fn full_request() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Alice".into()),
            last_name: Some("Sen".into()),
            email: Some("alice@example.com".into()),
            password: Some("secret123".into()),
            registration_number: Some("REG-2020-001".into()),
            mobile_number: Some("9876543210".into()),
            gender: Some("Female".into()),
            department: Some("CSE".into()),
            batch: Some("2020".into()),
            avatar_b64: None,
            avatar_content_type: None,
            admin_secret: None,
        }
    }

    #[test]
    fn student_registration_normalizes_to_pending_standard() {
        let reg = full_request().normalize(Some("hunter2")).unwrap();
        assert!(matches!(reg, Registration::Student(_)));
        assert_eq!(
            reg.standing(),
            Standing::Pending {
                role: Role::Standard
            }
        );
        assert_eq!(reg.fields().email, "alice@example.com");
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let mut req = full_request();
        req.email = Some("  Alice@Example.COM ".into());
        let reg = req.normalize(None).unwrap();
        assert_eq!(reg.fields().email, "alice@example.com");
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let req = RegisterRequest {
            first_name: None,
            last_name: Some("Sen".into()),
            email: Some("alice@example.com".into()),
            password: Some("secret123".into()),
            registration_number: None,
            mobile_number: None,
            gender: Some("Female".into()),
            department: Some("CSE".into()),
            batch: None,
            avatar_b64: None,
            avatar_content_type: None,
            admin_secret: None,
        };
        let err = req.normalize(None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("first_name"));
        assert!(msg.contains("registration_number"));
        assert!(msg.contains("mobile_number"));
        assert!(msg.contains("batch"));
        assert!(!msg.contains("gender"));
    }

    #[test]
    fn invalid_email_and_short_password_rejected() {
        let mut req = full_request();
        req.email = Some("not-an-email".into());
        assert!(req.normalize(None).is_err());

        let mut req = full_request();
        req.password = Some("short".into());
        assert!(req.normalize(None).is_err());
    }

    #[test]
    fn matching_bootstrap_secret_backfills_student_fields() {
        let req = RegisterRequest {
            first_name: Some("Root".into()),
            last_name: Some("Admin".into()),
            email: Some("admin@example.com".into()),
            password: Some("secret123".into()),
            registration_number: None,
            mobile_number: None,
            gender: None,
            department: None,
            batch: None,
            avatar_b64: None,
            avatar_content_type: None,
            admin_secret: Some("hunter2".into()),
        };
        let reg = req.normalize(Some("hunter2")).unwrap();
        assert!(matches!(reg, Registration::AdminBootstrap(_)));
        assert_eq!(reg.standing(), Standing::AdminBootstrapped);
        let f = reg.fields();
        assert_eq!(f.registration_number, "ADM-admin@example.com");
        assert_eq!(f.mobile_number, "0000000000");
        assert_eq!(f.gender, "Other");
        assert_eq!(f.department, "Administration");
        assert_eq!(f.batch, "N/A");
    }

    #[test]
    fn wrong_bootstrap_secret_falls_back_to_student_path() {
        let mut req = full_request();
        req.admin_secret = Some("not-the-secret".into());
        let reg = req.normalize(Some("hunter2")).unwrap();
        assert!(matches!(reg, Registration::Student(_)));
    }

    #[test]
    fn bootstrap_disabled_when_no_secret_configured() {
        let mut req = full_request();
        req.admin_secret = Some("hunter2".into());
        let reg = req.normalize(None).unwrap();
        assert!(matches!(reg, Registration::Student(_)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut req = full_request();
        req.admin_secret = Some("hunter2".into());
        let dbg = format!("{:?}", req);
        assert!(!dbg.contains("secret123"));
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn avatar_decodes_base64_payload() {
        let mut req = full_request();
        req.avatar_b64 = Some(base64::engine::general_purpose::STANDARD.encode(b"fakejpeg"));
        req.avatar_content_type = Some("image/jpeg".into());
        let (bytes, ct) = req.avatar().unwrap().unwrap();
        assert_eq!(&bytes[..], b"fakejpeg");
        assert_eq!(ct, "image/jpeg");

        req.avatar_b64 = Some("!!! not base64 !!!".into());
        assert!(req.avatar().unwrap().is_err());
    }

    #[test]
    fn public_account_serialization_never_contains_the_hash() {
        let account = Account {
            id: Uuid::new_v4(),
            first_name: "Alice".into(),
            last_name: "Sen".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            registration_number: "REG-2020-001".into(),
            mobile_number: "9876543210".into(),
            gender: "Female".into(),
            batch: "2020".into(),
            department: "CSE".into(),
            avatar_url: PLACEHOLDER_AVATAR.into(),
            role: Role::Standard,
            is_verified: false,
            membership: Membership::Free,
            membership_expiry: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicAccount::from(account)).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"name\":\"Alice Sen\""));
        assert!(json.contains("\"role\":\"standard\""));
    }
}

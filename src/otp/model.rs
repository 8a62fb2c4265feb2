//! OTP challenge models

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// What a verified code is used for
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[sqlx(type_name = "otp_purpose", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    #[default]
    Verification,
    Application,
    Login,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Verification => "verification",
            OtpPurpose::Application => "application",
            OtpPurpose::Login => "login",
        }
    }
}

/// Email and/or phone a challenge is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpIdentifier {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl OtpIdentifier {
    /// Normalize the inputs; at least one must be present
    pub fn new(email: Option<&str>, phone: Option<&str>) -> ApiResult<Self> {
        let email = email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        let phone = phone
            .map(|p| p.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect::<String>())
            .filter(|p| !p.is_empty());

        if let Some(e) = &email {
            if !validator::validate_email(e.as_str()) {
                return Err(ApiError::validation("Invalid email", vec!["email".into()]));
            }
        }
        if email.is_none() && phone.is_none() {
            return Err(ApiError::validation(
                "Email or phone required",
                vec!["email".into(), "phone".into()],
            ));
        }
        Ok(Self { email, phone })
    }

    /// Storage key; the email wins when both are given
    pub fn key(&self) -> String {
        match (&self.email, &self.phone) {
            (Some(email), _) => format!("email:{email}"),
            (None, Some(phone)) => format!("phone:{phone}"),
            (None, None) => String::new(),
        }
    }
}

/// Stored challenge; only a hash of the code is kept
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpChallenge {
    pub id: Uuid,
    pub identifier_key: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && self.expires_at > now
    }
}

/// Hash binding a code to its identifier and purpose
pub fn hash_code(identifier_key: &str, purpose: OtpPurpose, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(purpose.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(identifier_key.as_bytes());
    hasher.update(b":");
    hasher.update(code.trim().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_normalization() {
        let id = OtpIdentifier::new(Some("  A@B.com "), Some("+91 98765-43210")).unwrap();
        assert_eq!(id.email.as_deref(), Some("a@b.com"));
        assert_eq!(id.phone.as_deref(), Some("+919876543210"));
        assert_eq!(id.key(), "email:a@b.com");

        let phone_only = OtpIdentifier::new(None, Some("98765 43210")).unwrap();
        assert_eq!(phone_only.key(), "phone:9876543210");
    }

    #[test]
    fn test_identifier_requires_email_or_phone() {
        assert!(OtpIdentifier::new(None, None).is_err());
        assert!(OtpIdentifier::new(Some(" "), Some("--")).is_err());
        assert!(OtpIdentifier::new(Some("not-an-email"), None).is_err());
    }

    #[test]
    fn test_hash_is_bound_to_purpose() {
        let a = hash_code("email:a@b.com", OtpPurpose::Login, "123456");
        let b = hash_code("email:a@b.com", OtpPurpose::Application, "123456");
        assert_ne!(a, b);
        assert_eq!(a, hash_code("email:a@b.com", OtpPurpose::Login, " 123456 "));
        assert_eq!(a.len(), 64);
    }
}

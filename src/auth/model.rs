//! Auth request and response bodies

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};

use crate::models::User;
use crate::otp::OtpPurpose;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub purpose: OtpPurpose,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub delivered: bool,
    pub expires_at: DateTime<Utc>,
    /// Only present when delivery failed and the fallback is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub otp: String,
    #[serde(default)]
    pub purpose: OtpPurpose,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum VerifyOtpResponse {
    #[serde(rename_all = "camelCase")]
    Login { access_token: String, user: User },
    #[serde(rename_all = "camelCase")]
    Application {
        verification_token: String,
        expires_in: i64,
    },
    Verified { verified: bool },
}

//! Authentication service
//!
//! OTP-based login, verification tokens for the application wizard and
//! user lookup.

use std::sync::Arc;

use sqlx::types::chrono::Utc;
use uuid::Uuid;

use super::jwt::{generate_access_token, generate_verification_token, verify_token, JwtError, TokenType};
use super::model::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
use crate::error::{ApiError, ApiResult};
use crate::models::{User, UserRole};
use crate::otp::{OtpIdentifier, OtpPurpose, OtpService};
use crate::store::{StoreError, UserRepository};

/// Lifetime of the token proving an application OTP was verified
pub const VERIFICATION_TOKEN_TTL_SECONDS: i64 = 30 * 60;

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingFailed(msg) => ApiError::InternalError(msg),
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            JwtError::DecodingFailed(_) | JwtError::InvalidToken(_) => {
                ApiError::Unauthorized("Invalid token".to_string())
            }
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    otp: OtpService,
    jwt_secret: String,
    access_token_ttl: i64,
    expose_code_on_delivery_failure: bool,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        otp: OtpService,
        jwt_secret: String,
        access_token_ttl: i64,
        expose_code_on_delivery_failure: bool,
    ) -> Self {
        Self {
            users,
            otp,
            jwt_secret,
            access_token_ttl,
            expose_code_on_delivery_failure,
        }
    }

    pub async fn send_otp(&self, request: SendOtpRequest) -> ApiResult<SendOtpResponse> {
        let identifier = OtpIdentifier::new(request.email.as_deref(), request.phone.as_deref())?;
        let issued = self.otp.issue(&identifier, request.purpose).await?;

        let code = if !issued.delivered && self.expose_code_on_delivery_failure {
            tracing::warn!(
                purpose = request.purpose.as_str(),
                "Returning OTP in response because delivery failed"
            );
            Some(issued.code)
        } else {
            None
        };

        Ok(SendOtpResponse {
            delivered: issued.delivered,
            expires_at: issued.expires_at,
            code,
        })
    }

    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> ApiResult<VerifyOtpResponse> {
        let identifier = OtpIdentifier::new(request.email.as_deref(), request.phone.as_deref())
            .map_err(|_| ApiError::InvalidOtp)?;
        if request.purpose == OtpPurpose::Login && identifier.email.is_none() {
            return Err(ApiError::validation("Login requires an email", vec!["email".into()]));
        }
        self.otp
            .verify(&identifier, request.purpose, &request.otp)
            .await?;

        match request.purpose {
            OtpPurpose::Login => {
                let email = identifier.email.as_deref().unwrap_or_default();
                let user = self.get_or_create_user(email).await?;
                let access_token =
                    generate_access_token(&user, &self.jwt_secret, self.access_token_ttl)?;
                tracing::info!(user_id = %user.id, "User logged in");
                Ok(VerifyOtpResponse::Login { access_token, user })
            }
            OtpPurpose::Application => {
                let verification_token = generate_verification_token(
                    identifier.email.as_deref(),
                    identifier.phone.as_deref(),
                    OtpPurpose::Application.as_str(),
                    &self.jwt_secret,
                    VERIFICATION_TOKEN_TTL_SECONDS,
                )?;
                Ok(VerifyOtpResponse::Application {
                    verification_token,
                    expires_in: VERIFICATION_TOKEN_TTL_SECONDS,
                })
            }
            OtpPurpose::Verification => Ok(VerifyOtpResponse::Verified { verified: true }),
        }
    }

    /// Check an application verification token against the applicant
    ///
    /// The token must have been issued for the applicant's email, or for
    /// their phone when the verification was phone-only.
    pub fn verify_application_token(
        &self,
        token: Option<&str>,
        email: &str,
        phone: Option<&str>,
    ) -> ApiResult<()> {
        let token = token.filter(|t| !t.trim().is_empty()).ok_or(ApiError::InvalidOtp)?;
        let claims = verify_token(token.trim(), &self.jwt_secret).map_err(|_| ApiError::InvalidOtp)?;

        let purpose_ok = claims.purpose.as_deref() == Some(OtpPurpose::Application.as_str());
        let type_ok = claims.token_type == TokenType::Otp.as_str();
        let subject_ok = match (&claims.email, &claims.phone) {
            (Some(claimed), _) => claimed.eq_ignore_ascii_case(email.trim()),
            (None, Some(claimed)) => OtpIdentifier::new(None, phone)
                .ok()
                .and_then(|id| id.phone)
                .map_or(false, |p| &p == claimed),
            (None, None) => false,
        };

        if purpose_ok && type_ok && subject_ok {
            Ok(())
        } else {
            Err(ApiError::InvalidOtp)
        }
    }

    /// Find a user by email or register a new borrower
    pub async fn get_or_create_user(&self, email: &str) -> ApiResult<User> {
        let email = email.trim().to_lowercase();
        if let Some(user) = self.users.find_user_by_email(&email).await? {
            return Ok(user);
        }

        let user = User::new_borrower(&email);
        match self.users.insert_user(&user).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "Registered new borrower");
                Ok(user)
            }
            // Lost a race with a concurrent registration
            Err(StoreError::Conflict(_)) => self
                .users
                .find_user_by_email(&email)
                .await?
                .ok_or_else(|| ApiError::InternalError("user vanished after conflict".into())),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or promote an admin account
    pub async fn ensure_admin(&self, email: &str, name: Option<String>) -> ApiResult<User> {
        let mut user = self.get_or_create_user(email).await?;
        user.role = UserRole::Admin;
        if name.is_some() {
            user.name = name;
        }
        user.updated_at = Utc::now();
        self.users.update_user(&user).await?;
        tracing::info!(user_id = %user.id, "Admin account ready");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> ApiResult<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub fn issue_access_token(&self, user: &User) -> ApiResult<String> {
        Ok(generate_access_token(user, &self.jwt_secret, self.access_token_ttl)?)
    }

    /// Get JWT secret (for middleware)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn otp(&self) -> &OtpService {
        &self.otp
    }
}

//! JWT token generation and validation
//!
//! Handles creation and verification of access tokens and short-lived OTP
//! verification tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims shared by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID for access tokens, verified identifier for OTP tokens)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// User role (access tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// OTP purpose (verification tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// JWT ID
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Token type (access or otp)
    pub token_type: String,
}

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Otp,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Otp => "otp",
        }
    }
}

/// Generate an access token for a user
pub fn generate_access_token(user: &User, secret: &str, ttl_seconds: i64) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        email: Some(user.email.clone()),
        phone: user.phone.clone(),
        role: Some(user.role.as_str().to_string()),
        purpose: None,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
        token_type: TokenType::Access.as_str().to_string(),
    };
    sign(&claims, secret)
}

/// Generate a token proving a completed OTP verification for `purpose`
pub fn generate_verification_token(
    email: Option<&str>,
    phone: Option<&str>,
    purpose: &str,
    secret: &str,
    ttl_seconds: i64,
) -> Result<String, JwtError> {
    let sub = email
        .or(phone)
        .ok_or_else(|| JwtError::EncodingFailed("verification token needs an identifier".into()))?;
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        email: email.map(str::to_string),
        phone: phone.map(str::to_string),
        role: None,
        purpose: Some(purpose.to_string()),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
        token_type: TokenType::Otp.as_str().to_string(),
    };
    sign(&claims, secret)
}

fn sign(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Verify and decode a JWT token
///
/// # Returns
/// * `Ok(Claims)` if token is valid
/// * `Err(JwtError)` if validation fails
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })?;

    Ok(token_data.claims)
}

/// Extract user ID from claims
pub fn get_user_id_from_claims(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|e| JwtError::InvalidToken(e.to_string()))
}

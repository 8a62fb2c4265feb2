//! Authentication HTTP handlers
//!
//! OTP send/verify and the current-user lookup.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AuthenticatedUser;
use crate::auth::{AuthService, SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
use crate::error::ApiError;
use crate::models::{ApiResponse, User};

/// POST /api/auth/send-otp
pub async fn send_otp(
    State(auth): State<Arc<AuthService>>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<ApiResponse<SendOtpResponse>>, ApiError> {
    let response = auth.send_otp(req).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/auth/verify-otp
pub async fn verify_otp(
    State(auth): State<Arc<AuthService>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<VerifyOtpResponse>>, ApiError> {
    let response = auth.verify_otp(req).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/auth/me
pub async fn get_current_user(
    State(auth): State<Arc<AuthService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = auth.get_user(user.user_id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

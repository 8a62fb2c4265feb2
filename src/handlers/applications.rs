//! Loan application handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::AuthenticatedUser;
use crate::application::{Application, RejectRequest, SubmissionForm, UpdateApplicationRequest};
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::state::AppState;

/// POST /api/applications (multipart)
pub async fn submit_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Application>>), ApiError> {
    let form = SubmissionForm::from_multipart(multipart).await?;

    // A missing personalInfo is reported by validation instead
    if state.require_application_otp {
        if let Some(info) = &form.personal_info {
            state
                .auth_service
                .verify_application_token(
                    form.otp_token.as_deref(),
                    &info.email,
                    info.phone.as_deref(),
                )?;
        }
    }

    let outcome = state
        .application_service
        .submit(&user.actor(), form)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_warnings(outcome.application, outcome.warnings)),
    ))
}

pub async fn list_applications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Application>>>, ApiError> {
    let apps = state.application_service.list(&user.actor()).await?;
    Ok(Json(ApiResponse::ok(apps)))
}

pub async fn get_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let app = state.application_service.get(&user.actor(), id).await?;
    Ok(Json(ApiResponse::ok(app)))
}

pub async fn update_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateApplicationRequest>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let app = state
        .application_service
        .update(&user.actor(), id, request)
        .await?;
    Ok(Json(ApiResponse::ok(app)))
}

/// Non-admins reach the service and get `Forbidden` there
pub async fn approve_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let outcome = state.application_service.approve(&user.actor(), id).await?;
    Ok(Json(ApiResponse::with_warnings(outcome.application, outcome.warnings)))
}

pub async fn reject_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let reason = body.and_then(|Json(req)| req.rejection_reason);
    let outcome = state
        .application_service
        .reject(&user.actor(), id, reason)
        .await?;
    Ok(Json(ApiResponse::with_warnings(outcome.application, outcome.warnings)))
}

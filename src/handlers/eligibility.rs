//! Eligibility pre-check handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AdminUser;
use crate::eligibility::{EligibilityCheck, EligibilityQuery, EligibilityRequest, EligibilityService};
use crate::error::ApiError;
use crate::models::{ApiResponse, PaginatedResponse};

pub async fn submit_check(
    State(service): State<Arc<EligibilityService>>,
    Json(request): Json<EligibilityRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EligibilityCheck>>), ApiError> {
    let check = service.submit(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(check))))
}

pub async fn list_checks(
    State(service): State<Arc<EligibilityService>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<EligibilityQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<EligibilityCheck>>>, ApiError> {
    Ok(Json(ApiResponse::ok(service.list(query).await?)))
}

pub async fn get_check(
    State(service): State<Arc<EligibilityService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EligibilityCheck>>, ApiError> {
    Ok(Json(ApiResponse::ok(service.get(id).await?)))
}

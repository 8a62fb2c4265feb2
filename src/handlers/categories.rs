//! Loan category handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{AdminUser, AuthenticatedUser};
use crate::catalog::{
    CatalogService, CategoryLoanRequest, CategoryWithCount, CreateCategoryRequest, LoanCategory,
    LoanProduct, UpdateCategoryRequest,
};
use crate::error::ApiError;
use crate::models::{ApiResponse, UserRole};

/// GET /api/categories; counts are always included
pub async fn list_categories(
    State(catalog): State<Arc<CatalogService>>,
) -> Result<Json<ApiResponse<Vec<CategoryWithCount>>>, ApiError> {
    Ok(Json(ApiResponse::ok(catalog.list_categories().await?)))
}

pub async fn get_category(
    State(catalog): State<Arc<CatalogService>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LoanCategory>>, ApiError> {
    Ok(Json(ApiResponse::ok(catalog.get_category(id).await?)))
}

pub async fn create_category(
    State(catalog): State<Arc<CatalogService>>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoanCategory>>), ApiError> {
    let category = catalog.create_category(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(category))))
}

pub async fn update_category(
    State(catalog): State<Arc<CatalogService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<LoanCategory>>, ApiError> {
    Ok(Json(ApiResponse::ok(catalog.update_category(id, request).await?)))
}

pub async fn delete_category(
    State(catalog): State<Arc<CatalogService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Signed-in users see active loans; admins see all of them
pub async fn list_category_loans(
    State(catalog): State<Arc<CatalogService>>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<LoanProduct>>>, ApiError> {
    let include_inactive = user.role == UserRole::Admin;
    Ok(Json(ApiResponse::ok(
        catalog.loans_in_category(id, include_inactive).await?,
    )))
}

pub async fn create_category_loan(
    State(catalog): State<Arc<CatalogService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CategoryLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoanProduct>>), ApiError> {
    let loan = catalog.create_loan_in_category(id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(loan))))
}

//! Loan catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::AdminUser;
use crate::catalog::{CatalogService, CreateLoanRequest, EmiQuote, LoanProduct, UpdateLoanRequest};
use crate::error::ApiError;
use crate::models::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct EmiParams {
    pub amount: Option<f64>,
    pub tenure: Option<u32>,
}

pub async fn list_loans(
    State(catalog): State<Arc<CatalogService>>,
) -> Result<Json<ApiResponse<Vec<LoanProduct>>>, ApiError> {
    Ok(Json(ApiResponse::ok(catalog.list_active().await?)))
}

pub async fn list_loans_by_type(
    State(catalog): State<Arc<CatalogService>>,
    Path(loan_type): Path<String>,
) -> Result<Json<ApiResponse<Vec<LoanProduct>>>, ApiError> {
    Ok(Json(ApiResponse::ok(catalog.list_by_type(&loan_type).await?)))
}

pub async fn get_loan(
    State(catalog): State<Arc<CatalogService>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<LoanProduct>>, ApiError> {
    Ok(Json(ApiResponse::ok(catalog.get_by_slug(&slug).await?)))
}

pub async fn emi_preview(
    State(catalog): State<Arc<CatalogService>>,
    Path(slug): Path<String>,
    Query(params): Query<EmiParams>,
) -> Result<Json<ApiResponse<EmiQuote>>, ApiError> {
    let amount = params
        .amount
        .ok_or_else(|| ApiError::InvalidAmount("amount is required".into()))?;
    let tenure = params
        .tenure
        .ok_or_else(|| ApiError::InvalidTenure("tenure is required".into()))?;
    Ok(Json(ApiResponse::ok(catalog.emi_preview(&slug, amount, tenure).await?)))
}

pub async fn create_loan(
    State(catalog): State<Arc<CatalogService>>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoanProduct>>), ApiError> {
    let loan = catalog.create_loan(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(loan))))
}

pub async fn update_loan(
    State(catalog): State<Arc<CatalogService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLoanRequest>,
) -> Result<Json<ApiResponse<LoanProduct>>, ApiError> {
    Ok(Json(ApiResponse::ok(catalog.update_loan(id, request).await?)))
}

pub async fn delete_loan(
    State(catalog): State<Arc<CatalogService>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    catalog.delete_loan(id).await?;
    tracing::info!(loan_id = %id, admin = %admin.user_id, "Loan deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

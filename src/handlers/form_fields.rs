//! Dynamic form field handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::AdminUser;
use crate::error::ApiError;
use crate::forms::{
    CreateFormFieldRequest, FieldScope, FormFieldDefinition, FormSchemaService, RenderContract,
    UpdateFormFieldRequest,
};
use crate::models::ApiResponse;

pub async fn list_category_fields(
    State(forms): State<Arc<FormSchemaService>>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<FormFieldDefinition>>>, ApiError> {
    let fields = forms.list(FieldScope::CategoryId(category_id)).await?;
    Ok(Json(ApiResponse::ok(fields)))
}

pub async fn list_loan_fields(
    State(forms): State<Arc<FormSchemaService>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<FormFieldDefinition>>>, ApiError> {
    let fields = forms.list(FieldScope::LoanId(loan_id)).await?;
    Ok(Json(ApiResponse::ok(fields)))
}

/// Effective schema of a loan as UI control contracts
pub async fn render_loan_fields(
    State(forms): State<Arc<FormSchemaService>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RenderContract>>>, ApiError> {
    Ok(Json(ApiResponse::ok(forms.render_for_loan(loan_id).await?)))
}

pub async fn create_field(
    State(forms): State<Arc<FormSchemaService>>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<CreateFormFieldRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FormFieldDefinition>>), ApiError> {
    let field = forms.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(field))))
}

pub async fn update_field(
    State(forms): State<Arc<FormSchemaService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFormFieldRequest>,
) -> Result<Json<ApiResponse<FormFieldDefinition>>, ApiError> {
    Ok(Json(ApiResponse::ok(forms.update(id, request).await?)))
}

pub async fn delete_field(
    State(forms): State<Arc<FormSchemaService>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    forms.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

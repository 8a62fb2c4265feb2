//! Form schema service layer

use std::sync::Arc;

use uuid::Uuid;

use super::model::{CreateFormFieldRequest, FieldScope, FormFieldDefinition, UpdateFormFieldRequest};
use super::render::{render_schema, RenderContract};
use super::schema::{effective_schema, ordered_active};
use crate::catalog::LoanProduct;
use crate::error::{ApiError, ApiResult};
use crate::store::{CatalogRepository, FormFieldRepository, StoreError};

#[derive(Clone)]
pub struct FormSchemaService {
    fields: Arc<dyn FormFieldRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl FormSchemaService {
    pub fn new(fields: Arc<dyn FormFieldRepository>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { fields, catalog }
    }

    /// Active fields of a scope in presentation order
    pub async fn list(&self, scope: FieldScope) -> ApiResult<Vec<FormFieldDefinition>> {
        Ok(ordered_active(self.fields.list_fields(scope).await?))
    }

    /// Category fields merged with the loan's own fields
    pub async fn effective_for_loan(&self, loan: &LoanProduct) -> ApiResult<Vec<FormFieldDefinition>> {
        let category_fields = match loan.category_id {
            Some(id) => self.fields.list_fields(FieldScope::CategoryId(id)).await?,
            None => Vec::new(),
        };
        let loan_fields = self.fields.list_fields(FieldScope::LoanId(loan.id)).await?;
        Ok(effective_schema(category_fields, loan_fields))
    }

    pub async fn render_for_loan(&self, loan_id: Uuid) -> ApiResult<Vec<RenderContract>> {
        let loan = self
            .catalog
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;
        Ok(render_schema(&self.effective_for_loan(&loan).await?))
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<FormFieldDefinition> {
        self.fields
            .get_field(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Form field not found".to_string()))
    }

    pub async fn create(&self, request: CreateFormFieldRequest) -> ApiResult<FormFieldDefinition> {
        let field = FormFieldDefinition::from_request(request)?;
        self.ensure_scope_exists(field.scope).await?;
        let stored = self.fields.insert_field(&field).await.map_err(duplicate_name)?;
        tracing::info!(field_id = %stored.id, name = %stored.name, "Form field created");
        Ok(stored)
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateFormFieldRequest,
    ) -> ApiResult<FormFieldDefinition> {
        let mut field = self.get(id).await?;
        field.apply_update(request)?;
        self.fields.update_field(&field).await.map_err(duplicate_name)?;
        Ok(field)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        if !self.fields.delete_field(id).await? {
            return Err(ApiError::NotFound("Form field not found".to_string()));
        }
        tracing::info!(field_id = %id, "Form field deleted");
        Ok(())
    }

    async fn ensure_scope_exists(&self, scope: FieldScope) -> ApiResult<()> {
        let exists = match scope {
            FieldScope::LoanId(id) => self.catalog.get_loan(id).await?.is_some(),
            FieldScope::CategoryId(id) => self.catalog.get_category(id).await?.is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(ApiError::NotFound("Field owner not found".to_string()))
        }
    }
}

fn duplicate_name(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(_) => {
            ApiError::Conflict("A field with this name already exists for this scope".to_string())
        }
        other => other.into(),
    }
}

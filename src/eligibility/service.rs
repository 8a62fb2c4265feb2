//! Eligibility service layer

use std::sync::Arc;

use uuid::Uuid;

use super::model::{EligibilityCheck, EligibilityQuery, EligibilityRequest};
use crate::error::{ApiError, ApiResult};
use crate::models::{PaginatedResponse, PaginationParams};
use crate::store::EligibilityRepository;

#[derive(Clone)]
pub struct EligibilityService {
    repo: Arc<dyn EligibilityRepository>,
}

impl EligibilityService {
    pub fn new(repo: Arc<dyn EligibilityRepository>) -> Self {
        Self { repo }
    }

    /// Record a pre-check; no scoring happens here
    pub async fn submit(&self, request: EligibilityRequest) -> ApiResult<EligibilityCheck> {
        let check = request.into_check()?;
        self.repo.insert_check(&check).await?;
        tracing::info!(check_id = %check.id, loan_id = ?check.loan_id, "Eligibility check recorded");
        Ok(check)
    }

    pub async fn list(&self, query: EligibilityQuery) -> ApiResult<PaginatedResponse<EligibilityCheck>> {
        let (page, limit) = PaginationParams {
            page: query.page,
            limit: query.limit,
        }
        .resolve();
        let query = EligibilityQuery {
            email: query
                .email
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
            ..query
        };
        let (checks, total) = self.repo.list_checks(&query, (page - 1) * limit, limit).await?;
        Ok(PaginatedResponse::new(checks, total, page, limit))
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<EligibilityCheck> {
        self.repo
            .get_check(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Eligibility check not found".to_string()))
    }
}

//! Catalog service layer

use std::sync::Arc;

use uuid::Uuid;

use super::model::{
    CategoryLoanRequest, CategoryWithCount, CreateCategoryRequest, CreateLoanRequest, EmiQuote,
    LoanCategory, LoanFilter, LoanProduct, LoanType, UpdateCategoryRequest, UpdateLoanRequest,
};
use crate::application::emi::{calculate_emi, total_payable};
use crate::error::{ApiError, ApiResult};
use crate::store::{ApplicationRepository, CatalogRepository};

/// Loan products and categories
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
    applications: Arc<dyn ApplicationRepository>,
}

impl CatalogService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        applications: Arc<dyn ApplicationRepository>,
    ) -> Self {
        Self {
            catalog,
            applications,
        }
    }

    /// Active loans in display order
    pub async fn list_active(&self) -> ApiResult<Vec<LoanProduct>> {
        Ok(self
            .catalog
            .list_loans(LoanFilter {
                active_only: true,
                ..Default::default()
            })
            .await?)
    }

    pub async fn list_by_type(&self, loan_type: &str) -> ApiResult<Vec<LoanProduct>> {
        let loan_type = LoanType::parse(loan_type)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown loan type: {loan_type}")))?;
        Ok(self
            .catalog
            .list_loans(LoanFilter {
                active_only: true,
                loan_type: Some(loan_type),
                category_id: None,
            })
            .await?)
    }

    /// Public lookup; deactivated products are hidden
    pub async fn get_by_slug(&self, slug: &str) -> ApiResult<LoanProduct> {
        self.find_by_slug(slug)
            .await?
            .filter(|loan| loan.is_active)
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))
    }

    /// Lookup by slug regardless of status
    pub async fn find_by_slug(&self, slug: &str) -> ApiResult<Option<LoanProduct>> {
        Ok(self.catalog.get_loan_by_slug(slug).await?)
    }

    pub async fn get_loan(&self, id: Uuid) -> ApiResult<LoanProduct> {
        self.catalog
            .get_loan(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))
    }

    pub async fn create_loan(&self, request: CreateLoanRequest) -> ApiResult<LoanProduct> {
        if let Some(category_id) = request.category_id {
            self.get_category(category_id).await?;
        }
        let loan = LoanProduct::from_request(request)?;
        self.catalog.insert_loan(&loan).await?;
        tracing::info!(loan_id = %loan.id, slug = %loan.slug, "Loan product created");
        Ok(loan)
    }

    pub async fn update_loan(&self, id: Uuid, request: UpdateLoanRequest) -> ApiResult<LoanProduct> {
        let mut loan = self.get_loan(id).await?;
        if let Some(Some(category_id)) = request.category_id {
            self.get_category(category_id).await?;
        }
        loan.apply_update(request)?;
        self.catalog.update_loan(&loan).await?;
        tracing::info!(loan_id = %loan.id, "Loan product updated");
        Ok(loan)
    }

    /// Delete a loan that no application references
    pub async fn delete_loan(&self, id: Uuid) -> ApiResult<()> {
        let referencing = self.applications.count_for_loan(id).await?;
        if referencing > 0 {
            return Err(ApiError::Conflict(format!(
                "Loan is referenced by {referencing} application(s)"
            )));
        }
        if !self.catalog.delete_loan(id).await? {
            return Err(ApiError::NotFound("Loan not found".to_string()));
        }
        tracing::info!(loan_id = %id, "Loan product deleted");
        Ok(())
    }

    /// Installment preview at the product's current default rate
    pub async fn emi_preview(&self, slug: &str, amount: f64, tenure: u32) -> ApiResult<EmiQuote> {
        let loan = self.get_by_slug(slug).await?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ApiError::InvalidAmount("amount must be a positive number".into()));
        }
        if tenure == 0 {
            return Err(ApiError::InvalidTenure("tenure must be a positive number of months".into()));
        }
        loan.check_amount(amount)?;
        loan.check_tenure(tenure)?;

        let rate = loan.annual_rate();
        let emi = calculate_emi(amount, rate, tenure);
        let total = total_payable(emi, tenure);
        Ok(EmiQuote {
            loan_amount: amount,
            loan_tenure: tenure,
            interest_rate: rate,
            emi,
            total_payable: total,
            total_interest: total - amount.round() as i64,
        })
    }

    pub async fn list_categories(&self) -> ApiResult<Vec<CategoryWithCount>> {
        Ok(self.catalog.list_categories().await?)
    }

    pub async fn get_category(&self, id: Uuid) -> ApiResult<LoanCategory> {
        self.catalog
            .get_category(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))
    }

    pub async fn create_category(&self, request: CreateCategoryRequest) -> ApiResult<LoanCategory> {
        let name = request.name.unwrap_or_default();
        let category = LoanCategory::new(&name, request.description)?;
        self.catalog.insert_category(&category).await.map_err(|e| match e {
            crate::store::StoreError::Conflict(_) => {
                ApiError::Conflict("Category already exists".to_string())
            }
            other => other.into(),
        })?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> ApiResult<LoanCategory> {
        let mut category = self.get_category(id).await?;
        category.apply_update(request)?;
        self.catalog.update_category(&category).await?;
        Ok(category)
    }

    /// Delete a category that no loan references
    pub async fn delete_category(&self, id: Uuid) -> ApiResult<()> {
        let loans = self.catalog.count_loans_in_category(id).await?;
        if loans > 0 {
            return Err(ApiError::Conflict(format!(
                "Category has {loans} loan(s); move or delete them first"
            )));
        }
        if !self.catalog.delete_category(id).await? {
            return Err(ApiError::NotFound("Category not found".to_string()));
        }
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Loans of a category; deactivated ones only when `include_inactive`
    pub async fn loans_in_category(
        &self,
        id: Uuid,
        include_inactive: bool,
    ) -> ApiResult<Vec<LoanProduct>> {
        self.get_category(id).await?;
        Ok(self
            .catalog
            .list_loans(LoanFilter {
                active_only: !include_inactive,
                loan_type: None,
                category_id: Some(id),
            })
            .await?)
    }

    pub async fn create_loan_in_category(
        &self,
        id: Uuid,
        request: CategoryLoanRequest,
    ) -> ApiResult<LoanProduct> {
        self.get_category(id).await?;
        self.create_loan(request.into_create(id)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InterestRate, LoanType};
    use crate::store::Repositories;

    fn service() -> CatalogService {
        let repos = Repositories::memory();
        CatalogService::new(repos.catalog, repos.applications)
    }

    fn loan_request(name: &str, active: bool, category_id: Option<Uuid>) -> CreateLoanRequest {
        CreateLoanRequest {
            name: name.to_string(),
            slug: None,
            loan_type: LoanType::Personal,
            description: String::new(),
            category_id,
            interest_rate: InterestRate {
                min: 12.0,
                max: 18.0,
                default: None,
            },
            min_loan_amount: 10_000.0,
            max_loan_amount: 100_000.0,
            min_tenure: 6,
            max_tenure: 24,
            features: Vec::new(),
            benefits: Vec::new(),
            required_documents: Vec::new(),
            repayment_options: Vec::new(),
            image: None,
            is_active: Some(active),
            display_order: None,
        }
    }

    #[tokio::test]
    async fn test_inactive_loan_hidden_by_slug() {
        let catalog = service();
        let loan = catalog
            .create_loan(loan_request("Retired Loan", false, None))
            .await
            .unwrap();

        assert!(matches!(
            catalog.get_by_slug("retired-loan").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            catalog.emi_preview("retired-loan", 50_000.0, 12).await,
            Err(ApiError::NotFound(_))
        ));

        // Admin paths still see it
        assert_eq!(catalog.get_loan(loan.id).await.unwrap().slug, "retired-loan");
        assert!(catalog.find_by_slug("retired-loan").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_active_loan_served_by_slug() {
        let catalog = service();
        catalog
            .create_loan(loan_request("Quick Loan", true, None))
            .await
            .unwrap();
        assert_eq!(catalog.get_by_slug("quick-loan").await.unwrap().name, "Quick Loan");
        let quote = catalog.emi_preview("quick-loan", 50_000.0, 12).await.unwrap();
        assert_eq!(quote.interest_rate, 12.0);
    }

    #[tokio::test]
    async fn test_category_loans_filter_inactive() {
        let catalog = service();
        let category = catalog
            .create_category(CreateCategoryRequest {
                name: Some("Instant".into()),
                description: None,
            })
            .await
            .unwrap();
        for (name, active) in [("Live Loan", true), ("Paused Loan", false)] {
            catalog
                .create_loan(loan_request(name, active, Some(category.id)))
                .await
                .unwrap();
        }

        assert_eq!(catalog.loans_in_category(category.id, false).await.unwrap().len(), 1);
        assert_eq!(catalog.loans_in_category(category.id, true).await.unwrap().len(), 2);
    }
}

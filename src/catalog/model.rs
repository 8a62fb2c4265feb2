//! Loan catalog models: products and categories

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use super::slug::slugify;
use crate::error::{ApiError, ApiResult};
use crate::util::lenient_number;

/// Loan product type
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "loan_type", rename_all = "PascalCase")]
pub enum LoanType {
    Personal,
    Business,
    Home,
    Vehicle,
    Education,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Personal => "Personal",
            LoanType::Business => "Business",
            LoanType::Home => "Home",
            LoanType::Vehicle => "Vehicle",
            LoanType::Education => "Education",
        }
    }

    /// Case-insensitive parse, as used by `/loans/type/:type`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "personal" => Some(LoanType::Personal),
            "business" => Some(LoanType::Business),
            "home" => Some(LoanType::Home),
            "vehicle" => Some(LoanType::Vehicle),
            "education" => Some(LoanType::Education),
            _ => None,
        }
    }
}

/// Annual interest rate range, in percent
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct InterestRate {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub default: Option<f64>,
}

impl InterestRate {
    /// Rate applied to new applications: the default, or the minimum if unset
    pub fn effective(&self) -> f64 {
        self.default.unwrap_or(self.min)
    }
}

/// Title/description pair used for features and benefits
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoanHighlight {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RequiredDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

/// Example repayment plan shown on the product page
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentOption {
    pub tenure: u32,
    pub interest_rate: f64,
    #[serde(default)]
    pub emi: Option<i64>,
}

/// Loan product in the catalog
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoanProduct {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub loan_type: LoanType,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub interest_rate: InterestRate,
    pub min_loan_amount: f64,
    pub max_loan_amount: f64,
    /// Months
    pub min_tenure: i32,
    /// Months
    pub max_tenure: i32,
    pub features: Vec<LoanHighlight>,
    pub benefits: Vec<LoanHighlight>,
    pub required_documents: Vec<RequiredDocument>,
    pub repayment_options: Vec<RepaymentOption>,
    pub image: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanProduct {
    /// Build a product from an admin request, deriving the slug from the name
    pub fn from_request(req: CreateLoanRequest) -> ApiResult<Self> {
        let now = Utc::now();
        let slug = match req.slug.as_deref().map(slugify) {
            Some(s) if !s.is_empty() => s,
            _ => slugify(&req.name),
        };
        let loan = Self {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            slug,
            loan_type: req.loan_type,
            description: req.description,
            category_id: req.category_id,
            interest_rate: req.interest_rate,
            min_loan_amount: req.min_loan_amount,
            max_loan_amount: req.max_loan_amount,
            min_tenure: req.min_tenure,
            max_tenure: req.max_tenure,
            features: req.features,
            benefits: req.benefits,
            required_documents: req.required_documents,
            repayment_options: req.repayment_options,
            image: req.image,
            is_active: req.is_active.unwrap_or(true),
            display_order: req.display_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };
        loan.validate()?;
        Ok(loan)
    }

    /// Apply a partial update and re-check the product invariants
    pub fn apply_update(&mut self, req: UpdateLoanRequest) -> ApiResult<()> {
        if let Some(name) = req.name {
            self.name = name.trim().to_string();
            self.slug = slugify(&self.name);
        }
        if let Some(slug) = req.slug {
            self.slug = slugify(&slug);
        }
        if let Some(t) = req.loan_type {
            self.loan_type = t;
        }
        if let Some(d) = req.description {
            self.description = d;
        }
        if let Some(c) = req.category_id {
            self.category_id = c;
        }
        if let Some(r) = req.interest_rate {
            self.interest_rate = r;
        }
        if let Some(v) = req.min_loan_amount {
            self.min_loan_amount = v;
        }
        if let Some(v) = req.max_loan_amount {
            self.max_loan_amount = v;
        }
        if let Some(v) = req.min_tenure {
            self.min_tenure = v;
        }
        if let Some(v) = req.max_tenure {
            self.max_tenure = v;
        }
        if let Some(v) = req.features {
            self.features = v;
        }
        if let Some(v) = req.benefits {
            self.benefits = v;
        }
        if let Some(v) = req.required_documents {
            self.required_documents = v;
        }
        if let Some(v) = req.repayment_options {
            self.repayment_options = v;
        }
        if let Some(v) = req.image {
            self.image = v;
        }
        if let Some(v) = req.is_active {
            self.is_active = v;
        }
        if let Some(v) = req.display_order {
            self.display_order = v;
        }
        self.updated_at = Utc::now();
        self.validate()
    }

    /// Check the rate, amount and tenure invariants
    pub fn validate(&self) -> ApiResult<()> {
        let mut fields = Vec::new();
        let rate = &self.interest_rate;

        if self.name.is_empty() {
            fields.push("name".to_string());
        }
        if self.slug.is_empty() {
            fields.push("slug".to_string());
        }
        let rate_ok = rate.min.is_finite()
            && rate.max.is_finite()
            && rate.min >= 0.0
            && rate.min <= rate.max
            && rate
                .default
                .map_or(true, |d| d.is_finite() && rate.min <= d && d <= rate.max);
        if !rate_ok {
            fields.push("interestRate".to_string());
        }
        if !(self.min_loan_amount.is_finite()
            && self.max_loan_amount.is_finite()
            && self.min_loan_amount >= 0.0
            && self.min_loan_amount <= self.max_loan_amount)
        {
            fields.push("loanAmount".to_string());
        }
        if !(self.min_tenure >= 0 && self.min_tenure <= self.max_tenure) {
            fields.push("tenure".to_string());
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(
                "Loan product violates its rate, amount or tenure bounds",
                fields,
            ))
        }
    }

    /// Annual rate applied to new applications
    pub fn annual_rate(&self) -> f64 {
        self.interest_rate.effective()
    }

    pub fn check_amount(&self, amount: f64) -> ApiResult<()> {
        if amount < self.min_loan_amount || amount > self.max_loan_amount {
            return Err(ApiError::InvalidAmount(format!(
                "amount must be between {} and {}",
                self.min_loan_amount, self.max_loan_amount
            )));
        }
        Ok(())
    }

    pub fn check_tenure(&self, months: u32) -> ApiResult<()> {
        let months = i64::from(months);
        if months < i64::from(self.min_tenure) || months > i64::from(self.max_tenure) {
            return Err(ApiError::InvalidTenure(format!(
                "tenure must be between {} and {} months",
                self.min_tenure, self.max_tenure
            )));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// Request to create a loan product
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(rename = "type")]
    pub loan_type: LoanType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub interest_rate: InterestRate,
    pub min_loan_amount: f64,
    pub max_loan_amount: f64,
    pub min_tenure: i32,
    pub max_tenure: i32,
    #[serde(default)]
    pub features: Vec<LoanHighlight>,
    #[serde(default)]
    pub benefits: Vec<LoanHighlight>,
    #[serde(default)]
    pub required_documents: Vec<RequiredDocument>,
    #[serde(default)]
    pub repayment_options: Vec<RepaymentOption>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// Partial update of a loan product
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLoanRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(rename = "type")]
    pub loan_type: Option<LoanType>,
    pub description: Option<String>,
    /// `Some(None)` detaches the loan from its category
    #[serde(default, with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    pub interest_rate: Option<InterestRate>,
    pub min_loan_amount: Option<f64>,
    pub max_loan_amount: Option<f64>,
    pub min_tenure: Option<i32>,
    pub max_tenure: Option<i32>,
    pub features: Option<Vec<LoanHighlight>>,
    pub benefits: Option<Vec<LoanHighlight>>,
    pub required_documents: Option<Vec<RequiredDocument>>,
    pub repayment_options: Option<Vec<RepaymentOption>>,
    #[serde(default, with = "double_option")]
    pub image: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Flat loan payload used by `POST /categories/:id/loans`
///
/// Numbers may arrive as strings; a missing max or default rate falls back
/// to the minimum, and missing amounts or tenures become zero.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLoanRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub loan_type: Option<LoanType>,
    #[serde(default)]
    pub interest_rate_min: Value,
    #[serde(default)]
    pub interest_rate_max: Value,
    #[serde(default)]
    pub interest_rate_default: Value,
    #[serde(default)]
    pub min_loan_amount: Value,
    #[serde(default)]
    pub max_loan_amount: Value,
    #[serde(default)]
    pub min_tenure: Value,
    #[serde(default)]
    pub max_tenure: Value,
}

impl CategoryLoanRequest {
    pub fn into_create(self, category_id: Uuid) -> ApiResult<CreateLoanRequest> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ApiError::validation("Loan name required", vec!["name".into()]))?;
        let loan_type = self
            .loan_type
            .ok_or_else(|| ApiError::validation("Loan type required", vec!["type".into()]))?;

        let num = |v: &Value| lenient_number(v).filter(|n| *n != 0.0);
        let min = num(&self.interest_rate_min).unwrap_or(0.0);
        let max = num(&self.interest_rate_max).unwrap_or(min);
        let default = num(&self.interest_rate_default).unwrap_or(min);

        Ok(CreateLoanRequest {
            name,
            slug: None,
            loan_type,
            description: self.description,
            category_id: Some(category_id),
            interest_rate: InterestRate {
                min,
                max,
                default: Some(default),
            },
            min_loan_amount: num(&self.min_loan_amount).unwrap_or(0.0),
            max_loan_amount: num(&self.max_loan_amount).unwrap_or(0.0),
            min_tenure: num(&self.min_tenure).unwrap_or(0.0) as i32,
            max_tenure: num(&self.max_tenure).unwrap_or(0.0) as i32,
            features: Vec::new(),
            benefits: Vec::new(),
            required_documents: Vec::new(),
            repayment_options: Vec::new(),
            image: None,
            is_active: None,
            display_order: None,
        })
    }
}

/// Filter for catalog listings
#[derive(Debug, Default, Clone, Copy)]
pub struct LoanFilter {
    pub active_only: bool,
    pub loan_type: Option<LoanType>,
    pub category_id: Option<Uuid>,
}

/// Loan category
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoanCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanCategory {
    pub fn new(name: &str, description: Option<String>) -> ApiResult<Self> {
        let name = name.trim();
        let slug = slugify(name);
        if name.is_empty() || slug.is_empty() {
            return Err(ApiError::validation("Name required", vec!["name".into()]));
        }
        if name.chars().count() > 100 {
            return Err(ApiError::validation(
                "Name must be at most 100 characters",
                vec!["name".into()],
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug,
            description,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, req: UpdateCategoryRequest) -> ApiResult<()> {
        if let Some(name) = req.name.filter(|n| !n.trim().is_empty()) {
            let renamed = Self::new(&name, None)?;
            self.name = renamed.name;
            self.slug = renamed.slug;
        }
        if let Some(d) = req.description {
            self.description = Some(d);
        }
        if let Some(a) = req.active {
            self.active = a;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Category with the number of loans attached to it
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: LoanCategory,
    pub loan_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// EMI quote for a catalog product
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EmiQuote {
    pub loan_amount: f64,
    pub loan_tenure: u32,
    pub interest_rate: f64,
    pub emi: i64,
    pub total_payable: i64,
    pub total_interest: i64,
}

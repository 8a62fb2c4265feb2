//! Eligibility pre-check records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::util::lenient_number;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "employment_type")]
pub enum EmploymentType {
    #[serde(rename = "SALARIED")]
    #[sqlx(rename = "SALARIED")]
    Salaried,
    #[serde(rename = "SELF EMPLOYED")]
    #[sqlx(rename = "SELF EMPLOYED")]
    SelfEmployed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "eligibility_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EligibilityStatus {
    #[default]
    Pending,
    Reviewed,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityCheck {
    pub id: Uuid,
    pub email: String,
    pub loan_id: Option<Uuid>,
    pub pancard: String,
    pub dob: NaiveDate,
    pub gender: String,
    pub personal_email: String,
    pub employment_type: EmploymentType,
    pub company_name: Option<String>,
    pub next_salary_date: Option<NaiveDate>,
    pub net_monthly_income: f64,
    pub pin_code: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub status: EligibilityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw eligibility form; all fields optional until validated
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRequest {
    pub email: Option<String>,
    pub loan_id: Option<Uuid>,
    pub pancard: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub personal_email: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub company_name: Option<String>,
    pub next_salary_date: Option<String>,
    #[serde(default)]
    pub net_monthly_income: Value,
    pub pin_code: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

fn present(v: &Option<String>) -> Option<String> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

fn parse_date(s: &str, field: &str) -> ApiResult<NaiveDate> {
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("Invalid date for {field}"), vec![field.into()]))
}

impl EligibilityRequest {
    pub fn into_check(self) -> ApiResult<EligibilityCheck> {
        let email = present(&self.email);
        let pancard = present(&self.pancard);
        let dob = present(&self.dob);
        let gender = present(&self.gender);
        let personal_email = present(&self.personal_email);
        let income = lenient_number(&self.net_monthly_income);
        let pin_code = present(&self.pin_code);

        let mut missing = Vec::new();
        for (name, ok) in [
            ("email", email.is_some()),
            ("pancard", pancard.is_some()),
            ("dob", dob.is_some()),
            ("gender", gender.is_some()),
            ("personalEmail", personal_email.is_some()),
            ("employmentType", self.employment_type.is_some()),
            ("netMonthlyIncome", income.is_some()),
            ("pinCode", pin_code.is_some()),
        ] {
            if !ok {
                missing.push(name.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(ApiError::validation("Please fill all required fields", missing));
        }

        let email = email.unwrap_or_default();
        let pancard = pancard.unwrap_or_default();
        let dob = dob.unwrap_or_default();
        let gender = gender.unwrap_or_default();
        let personal_email = personal_email.unwrap_or_default();
        let net_monthly_income = income.unwrap_or_default();
        let pin_code = pin_code.unwrap_or_default();
        let Some(employment_type) = self.employment_type else {
            return Err(ApiError::validation(
                "Please fill all required fields",
                vec!["employmentType".into()],
            ));
        };

        let company_name = present(&self.company_name);
        let next_salary_date = present(&self.next_salary_date);
        if employment_type == EmploymentType::Salaried
            && (company_name.is_none() || next_salary_date.is_none())
        {
            return Err(ApiError::validation(
                "Company name and next salary date are required for salaried employees",
                vec!["companyName".into(), "nextSalaryDate".into()],
            ));
        }

        let now = Utc::now();
        Ok(EligibilityCheck {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            loan_id: self.loan_id,
            pancard: pancard.to_uppercase(),
            dob: parse_date(&dob, "dob")?,
            gender,
            personal_email: personal_email.to_lowercase(),
            employment_type,
            company_name,
            next_salary_date: next_salary_date
                .as_deref()
                .map(|d| parse_date(d, "nextSalaryDate"))
                .transpose()?,
            net_monthly_income,
            pin_code,
            state: present(&self.state),
            city: present(&self.city),
            status: EligibilityStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Admin listing filter
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub email: Option<String>,
    pub loan_id: Option<Uuid>,
}

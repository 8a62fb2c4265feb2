//! Loan application data models

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::catalog::LoanType;
use crate::forms::DynamicValues;
use crate::models::UserRole;
use crate::util::de_lenient_f64;

/// Application status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "application_status", rename_all = "PascalCase")]
pub enum ApplicationStatus {
    /// Reserved; no flow creates drafts yet
    Draft,
    Submitted,
    UnderReview,
    DocumentsPending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const NON_TERMINAL: [ApplicationStatus; 4] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::DocumentsPending,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub pan_number: Option<String>,
    pub aadhar_number: Option<String>,
}

impl PersonalInfo {
    /// Trim text fields and lowercase the email
    pub fn normalized(mut self) -> Self {
        self.full_name = self.full_name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.pan_number = self.pan_number.map(|p| p.trim().to_uppercase());
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AddressInfo {
    pub current: Address,
    pub permanent: Address,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmploymentInfo {
    pub employment_type: Option<String>,
    pub company_name: Option<String>,
    pub designation: Option<String>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub monthly_income: Option<f64>,
    pub work_experience: Option<String>,
}

/// Amount, tenure and the rate/EMI snapshot taken at submission
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub loan_amount: f64,
    /// Months
    pub loan_tenure: u32,
    /// Annual percent
    pub interest_rate: f64,
    pub emi: i64,
    #[serde(default)]
    pub purpose: Option<String>,
}

/// Kind of an attached document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Id,
    Address,
    Income,
    BankStatement,
    Other,
    /// Upload for a dynamic File field, tagged with the field name
    Dynamic(String),
}

impl DocumentType {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentType::Id => "ID",
            DocumentType::Address => "Address",
            DocumentType::Income => "Income",
            DocumentType::BankStatement => "Bank Statement",
            DocumentType::Other => "Other",
            DocumentType::Dynamic(name) => name,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ID" => DocumentType::Id,
            "Address" => DocumentType::Address,
            "Income" => DocumentType::Income,
            "Bank Statement" => DocumentType::BankStatement,
            "Other" => DocumentType::Other,
            other => DocumentType::Dynamic(other.to_string()),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DocumentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocumentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DocumentType::parse(&s))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    /// Original file name
    pub name: String,
    pub url: String,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}

/// Loan application
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub application_number: String,
    pub user_id: Uuid,
    pub loan_id: Uuid,
    pub loan_type: LoanType,
    pub personal_info: PersonalInfo,
    pub address: AddressInfo,
    pub employment_info: EmploymentInfo,
    pub loan_details: LoanDetails,
    pub dynamic_fields: DynamicValues,
    pub documents: Vec<Document>,
    pub status: ApplicationStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Human-readable application number, e.g. `APP2026000042`
pub fn format_application_number(at: DateTime<Utc>, seq: u64) -> String {
    format!("APP{}{:06}", at.year(), seq)
}

/// Status change applied atomically by the store
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub at: DateTime<Utc>,
    pub actor: Uuid,
    pub rejection_reason: Option<String>,
}

impl StatusChange {
    pub fn apply(&self, app: &mut Application) {
        app.status = self.status;
        app.updated_at = self.at;
        match self.status {
            ApplicationStatus::Approved => {
                app.approved_at = Some(self.at);
                app.approved_by = Some(self.actor);
            }
            ApplicationStatus::Rejected => {
                app.rejected_at = Some(self.at);
                app.rejected_by = Some(self.actor);
                app.rejection_reason = self.rejection_reason.clone();
            }
            _ => {}
        }
    }
}

/// Caller identity used by the authorization rules
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Editable parts of an application
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationRequest {
    pub personal_info: Option<PersonalInfo>,
    pub address: Option<AddressInfo>,
    pub employment_info: Option<EmploymentInfo>,
    pub purpose: Option<String>,
    pub dynamic_fields: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub rejection_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use chrono::TimeZone;

    #[test]
    fn test_document_type_names() {
        assert_eq!(
            serde_json::to_value(DocumentType::BankStatement).unwrap(),
            json!("Bank Statement")
        );
        let parsed: DocumentType = serde_json::from_value(json!("salarySlip")).unwrap();
        assert_eq!(parsed, DocumentType::Dynamic("salarySlip".into()));
        let parsed: DocumentType = serde_json::from_value(json!("ID")).unwrap();
        assert_eq!(parsed, DocumentType::Id);
    }

    #[test]
    fn test_application_number_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(format_application_number(at, 42), "APP2026000042");
        assert_eq!(format_application_number(at, 12_345_678), "APP202612345678");
    }

    #[test]
    fn test_terminal_states() {
        assert!(ApplicationStatus::Approved.is_terminal());
        assert!(ApplicationStatus::Rejected.is_terminal());
        assert!(ApplicationStatus::NON_TERMINAL.iter().all(|s| !s.is_terminal()));
    }

    #[test]
    fn test_personal_info_validation() {
        let info = PersonalInfo {
            full_name: "".into(),
            email: "nope".into(),
            ..Default::default()
        };
        let err = info.validate().unwrap_err();
        let mut fields: Vec<_> = err.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        assert_eq!(fields, vec!["email", "full_name"]);
    }

    #[test]
    fn test_employment_income_accepts_strings() {
        let info: EmploymentInfo =
            serde_json::from_value(json!({ "monthlyIncome": "52000", "companyName": "Acme" }))
                .unwrap();
        assert_eq!(info.monthly_income, Some(52000.0));
    }
}

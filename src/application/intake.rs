//! Submission input adapters
//!
//! Turns the wizard's multipart body into a typed submission. Sections
//! arrive as JSON strings; files arrive under group names.

use axum::body::Bytes;
use axum::extract::Multipart;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::model::{AddressInfo, DocumentType, EmploymentInfo, PersonalInfo};
use crate::error::{ApiError, ApiResult};
use crate::forms::{parse_dynamic_values, DynamicValues, ACCEPTED_FILE_EXTENSIONS};
use crate::util::lenient_number;

/// Multipart prefix for uploads belonging to dynamic File fields
pub const DYNAMIC_FILE_PREFIX: &str = "dynamicFiles_";

/// Loan amount and tenure as posted, under either naming
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetailsInput {
    #[serde(default)]
    pub loan_amount: Value,
    #[serde(default)]
    pub principal: Value,
    #[serde(default)]
    pub loan_tenure: Value,
    #[serde(default)]
    pub tenure_months: Value,
    #[serde(default)]
    pub purpose: Option<String>,
}

fn first_present<'a>(canonical: &'a Value, alternate: &'a Value) -> &'a Value {
    match canonical {
        Value::Null => alternate,
        Value::String(s) if s.trim().is_empty() => alternate,
        _ => canonical,
    }
}

impl LoanDetailsInput {
    /// Resolve `(amount, tenure_months)`; the canonical names win over
    /// `principal`/`tenureMonths` when both are sent
    pub fn normalize(&self) -> ApiResult<(f64, u32)> {
        let amount = lenient_number(first_present(&self.loan_amount, &self.principal))
            .filter(|a| *a > 0.0)
            .ok_or_else(|| ApiError::InvalidAmount("loan amount must be a positive number".into()))?;

        let tenure = lenient_number(first_present(&self.loan_tenure, &self.tenure_months))
            .filter(|t| *t > 0.0 && t.fract() == 0.0 && *t <= f64::from(u32::MAX))
            .ok_or_else(|| {
                ApiError::InvalidTenure("loan tenure must be a positive whole number of months".into())
            })?;

        Ok((amount, tenure as u32))
    }
}

/// Upload group a multipart file field belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileGroup {
    IdProof,
    AddressProof,
    IncomeProof,
    BankStatement,
    OtherDocuments,
    /// `dynamicFiles_<fieldName>`
    Dynamic(String),
}

impl FileGroup {
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "idProof" => Some(FileGroup::IdProof),
            "addressProof" => Some(FileGroup::AddressProof),
            "incomeProof" => Some(FileGroup::IncomeProof),
            "bankStatement" => Some(FileGroup::BankStatement),
            "otherDocuments" => Some(FileGroup::OtherDocuments),
            other => other
                .strip_prefix(DYNAMIC_FILE_PREFIX)
                .filter(|field| !field.is_empty())
                .map(|field| FileGroup::Dynamic(field.to_string())),
        }
    }

    pub fn document_type(&self) -> DocumentType {
        match self {
            FileGroup::IdProof => DocumentType::Id,
            FileGroup::AddressProof => DocumentType::Address,
            FileGroup::IncomeProof => DocumentType::Income,
            FileGroup::BankStatement => DocumentType::BankStatement,
            FileGroup::OtherDocuments => DocumentType::Other,
            FileGroup::Dynamic(field) => DocumentType::Dynamic(field.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub group: FileGroup,
    pub file_name: String,
    /// Lowercased, one of the accepted extensions
    pub extension: String,
    pub bytes: Bytes,
}

/// Extension of `file_name` if it is an accepted upload type
pub fn accepted_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ACCEPTED_FILE_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// A parsed application submission
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub loan_id: Option<Uuid>,
    pub personal_info: Option<PersonalInfo>,
    pub address: AddressInfo,
    pub employment_info: EmploymentInfo,
    pub loan_details: LoanDetailsInput,
    pub dynamic_fields: DynamicValues,
    pub otp_token: Option<String>,
    pub files: Vec<UploadedFile>,
}

fn parse_section<T: serde::de::DeserializeOwned>(name: &str, raw: &str) -> ApiResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| ApiError::validation(format!("{name} is not valid JSON: {e}"), vec![name.into()]))
}

impl SubmissionForm {
    /// Read every part of the multipart body
    ///
    /// Nothing is stored here; an aborted upload leaves no trace.
    pub async fn from_multipart(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = SubmissionForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(group) = FileGroup::from_field_name(&name) {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {name}: {e}")))?;
                if bytes.is_empty() {
                    continue;
                }
                let extension = accepted_extension(&file_name).ok_or_else(|| {
                    ApiError::validation(
                        format!("{file_name}: only pdf, jpg, jpeg and png files are accepted"),
                        vec![name.clone()],
                    )
                })?;
                form.files.push(UploadedFile {
                    group,
                    file_name,
                    extension,
                    bytes,
                });
                continue;
            }

            if field.file_name().is_some() {
                return Err(ApiError::validation(
                    format!("Unexpected file field: {name}"),
                    vec![name],
                ));
            }

            let text = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read {name}: {e}")))?;
            form.set_text_part(&name, &text)?;
        }

        Ok(form)
    }

    /// Apply one non-file part; unknown names are ignored
    pub fn set_text_part(&mut self, name: &str, text: &str) -> ApiResult<()> {
        match name {
            "loanId" => {
                let id = Uuid::parse_str(text.trim())
                    .map_err(|_| ApiError::validation("Invalid loanId", vec!["loanId".into()]))?;
                self.loan_id = Some(id);
            }
            "personalInfo" => self.personal_info = Some(parse_section(name, text)?),
            "address" => self.address = parse_section(name, text)?,
            "employmentInfo" => self.employment_info = parse_section(name, text)?,
            "loanDetails" => self.loan_details = parse_section(name, text)?,
            "dynamicFields" => {
                self.dynamic_fields = parse_dynamic_values(parse_section(name, text)?)?;
            }
            "otpToken" => self.otp_token = Some(text.trim().to_string()),
            other => tracing::debug!(part = other, "Ignoring unknown multipart part"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details(v: Value) -> LoanDetailsInput {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_canonical_names() {
        let d = details(json!({ "loanAmount": 50000, "loanTenure": 12 }));
        assert_eq!(d.normalize().unwrap(), (50000.0, 12));
    }

    #[test]
    fn test_alternate_names() {
        let d = details(json!({ "principal": "75000", "tenureMonths": "24" }));
        assert_eq!(d.normalize().unwrap(), (75000.0, 24));
    }

    #[test]
    fn test_canonical_wins_when_both_present() {
        let d = details(json!({
            "loanAmount": 1000, "principal": 2000,
            "loanTenure": 6, "tenureMonths": 9
        }));
        assert_eq!(d.normalize().unwrap(), (1000.0, 6));
    }

    #[test]
    fn test_empty_canonical_falls_back() {
        let d = details(json!({ "loanAmount": "", "principal": 3000, "loanTenure": 3 }));
        assert_eq!(d.normalize().unwrap(), (3000.0, 3));
    }

    #[test]
    fn test_rejects_non_positive_or_fractional() {
        assert!(matches!(
            details(json!({ "loanAmount": -5, "loanTenure": 12 })).normalize(),
            Err(ApiError::InvalidAmount(_))
        ));
        assert!(matches!(
            details(json!({ "loanAmount": "abc", "loanTenure": 12 })).normalize(),
            Err(ApiError::InvalidAmount(_))
        ));
        assert!(matches!(
            details(json!({ "loanAmount": 5000, "loanTenure": 2.5 })).normalize(),
            Err(ApiError::InvalidTenure(_))
        ));
        assert!(matches!(
            details(json!({ "loanAmount": 5000 })).normalize(),
            Err(ApiError::InvalidTenure(_))
        ));
    }

    #[test]
    fn test_file_groups() {
        assert_eq!(
            FileGroup::from_field_name("bankStatement").map(|g| g.document_type()),
            Some(DocumentType::BankStatement)
        );
        assert_eq!(
            FileGroup::from_field_name("dynamicFiles_salarySlip"),
            Some(FileGroup::Dynamic("salarySlip".into()))
        );
        assert_eq!(FileGroup::from_field_name("dynamicFiles_"), None);
        assert_eq!(FileGroup::from_field_name("avatar"), None);
    }

    #[test]
    fn test_accepted_extensions() {
        assert_eq!(accepted_extension("scan.PDF").as_deref(), Some("pdf"));
        assert_eq!(accepted_extension("photo.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(accepted_extension("virus.exe"), None);
        assert_eq!(accepted_extension("noext"), None);
    }

    #[test]
    fn test_text_parts() {
        let mut form = SubmissionForm::default();
        form.set_text_part("personalInfo", r#"{"fullName":"Asha","email":"a@b.com"}"#)
            .unwrap();
        form.set_text_part("dynamicFields", r#"{"employer":"Acme","extra":1}"#)
            .unwrap();
        form.set_text_part("otpToken", " tok ").unwrap();
        assert_eq!(form.personal_info.as_ref().unwrap().full_name, "Asha");
        assert_eq!(form.dynamic_fields.len(), 2);
        assert_eq!(form.otp_token.as_deref(), Some("tok"));
        assert!(form.set_text_part("loanId", "nope").is_err());
        assert!(form.set_text_part("address", "{bad").is_err());
    }
}

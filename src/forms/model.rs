//! Form field definitions for the application wizard

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::DocumentType;
use crate::error::{ApiError, ApiResult};

/// Input kind of a dynamic field
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[sqlx(type_name = "field_kind", rename_all = "PascalCase")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Email,
    Phone,
    Date,
    Textarea,
    Select,
    Radio,
    Checkbox,
    File,
}

impl FieldKind {
    /// Kinds that need a non-empty option list
    pub fn needs_options(&self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::Radio)
    }
}

/// Display width in the wizard grid
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "field_width", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FieldWidth {
    #[default]
    Full,
    Half,
    Third,
    Quarter,
}

/// Owner of a field definition set
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FieldScope {
    LoanId(Uuid),
    CategoryId(Uuid),
}

impl FieldScope {
    pub fn from_ids(loan_id: Option<Uuid>, category_id: Option<Uuid>) -> ApiResult<Self> {
        match (loan_id, category_id) {
            (Some(id), None) => Ok(FieldScope::LoanId(id)),
            (None, Some(id)) => Ok(FieldScope::CategoryId(id)),
            _ => Err(ApiError::validation(
                "Exactly one of loanId or categoryId is required",
                vec!["loanId".into(), "categoryId".into()],
            )),
        }
    }

    pub fn loan_id(&self) -> Option<Uuid> {
        match self {
            FieldScope::LoanId(id) => Some(*id),
            FieldScope::CategoryId(_) => None,
        }
    }

    pub fn category_id(&self) -> Option<Uuid> {
        match self {
            FieldScope::CategoryId(id) => Some(*id),
            FieldScope::LoanId(_) => None,
        }
    }
}

/// A single configurable field of the application form
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldDefinition {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: FieldScope,
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub options: Vec<String>,
    pub required: bool,
    pub placeholder: Option<String>,
    pub width: FieldWidth,
    /// Wizard step the field belongs to, e.g. "employment"
    pub section: Option<String>,
    pub order: i32,
    pub is_active: bool,
    /// Insertion sequence, breaks ties between equal `order` values
    #[serde(skip)]
    pub seq: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormFieldDefinition {
    pub fn from_request(req: CreateFormFieldRequest) -> ApiResult<Self> {
        let scope = FieldScope::from_ids(req.loan_id, req.category_id)?;
        let name = req.name.trim().to_string();
        let now = Utc::now();
        let field = Self {
            id: Uuid::new_v4(),
            scope,
            label: req
                .label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| name.clone()),
            name,
            kind: req.kind,
            options: clean_options(req.options),
            required: req.required,
            placeholder: req.placeholder.map(|p| p.trim().to_string()),
            width: req.width,
            section: req.section,
            order: req.order,
            is_active: req.is_active.unwrap_or(true),
            seq: 0,
            created_at: now,
            updated_at: now,
        };
        field.validate()?;
        Ok(field)
    }

    pub fn apply_update(&mut self, req: UpdateFormFieldRequest) -> ApiResult<()> {
        if let Some(name) = req.name {
            self.name = name.trim().to_string();
        }
        if let Some(label) = req.label {
            self.label = label.trim().to_string();
        }
        if let Some(kind) = req.kind {
            self.kind = kind;
        }
        if let Some(options) = req.options {
            self.options = clean_options(options);
        }
        if let Some(required) = req.required {
            self.required = required;
        }
        if let Some(placeholder) = req.placeholder {
            self.placeholder = Some(placeholder.trim().to_string());
        }
        if let Some(width) = req.width {
            self.width = width;
        }
        if let Some(section) = req.section {
            self.section = Some(section);
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        if let Some(active) = req.is_active {
            self.is_active = active;
        }
        self.updated_at = Utc::now();
        self.validate()
    }

    /// A field needs a name, and choice fields need at least one option.
    /// File fields may not reuse a built-in document type name.
    pub fn validate(&self) -> ApiResult<()> {
        if self.name.is_empty() {
            return Err(ApiError::validation("Field name required", vec!["name".into()]));
        }
        if self.kind == FieldKind::File
            && !matches!(DocumentType::parse(&self.name), DocumentType::Dynamic(_))
        {
            return Err(ApiError::validation(
                format!("{} is reserved for built-in documents", self.name),
                vec!["name".into()],
            ));
        }
        if self.kind.needs_options() && self.options.is_empty() {
            return Err(ApiError::validation(
                format!("{:?} fields need at least one option", self.kind),
                vec!["options".into()],
            ));
        }
        Ok(())
    }
}

fn clean_options(options: Vec<String>) -> Vec<String> {
    options
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

/// Request to create a field definition
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormFieldRequest {
    #[serde(default)]
    pub loan_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub width: FieldWidth,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update of a field definition; the scope cannot change
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFormFieldRequest {
    pub name: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<FieldKind>,
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
    pub placeholder: Option<String>,
    pub width: Option<FieldWidth>,
    pub section: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

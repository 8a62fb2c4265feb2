//! Server-side validation of dynamic field values

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{FieldKind, FormFieldDefinition};
use crate::error::{ApiError, ApiResult};
use crate::util::lenient_number;

/// Value submitted for a dynamic field
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    /// File references or multi-select choices
    List(Vec<String>),
}

impl FieldValue {
    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }
}

/// Dynamic values keyed by field name
pub type DynamicValues = BTreeMap<String, FieldValue>;

/// Convert a submitted JSON object into dynamic values
///
/// Nulls are dropped. Nested objects and non-string list items are rejected.
pub fn parse_dynamic_values(value: Value) -> ApiResult<DynamicValues> {
    let map = match value {
        Value::Null => return Ok(DynamicValues::new()),
        Value::Object(map) => map,
        _ => return Err(ApiError::BadRequest("dynamicFields must be an object".into())),
    };

    let mut values = DynamicValues::new();
    let mut bad = Vec::new();
    for (key, raw) in map {
        let parsed = match raw {
            Value::Null => continue,
            Value::Bool(b) => Some(FieldValue::Bool(b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s)),
            Value::Array(items) => items
                .into_iter()
                .map(|i| match i {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::List),
            Value::Object(_) => None,
        };
        match parsed {
            Some(v) => {
                values.insert(key, v);
            }
            None => bad.push(key),
        }
    }

    if bad.is_empty() {
        Ok(values)
    } else {
        Err(ApiError::validation(
            format!("Unsupported values for: {}", bad.join(", ")),
            bad,
        ))
    }
}

/// Check submitted values against an ordered schema
///
/// Required File fields are satisfied by an upload under their name in
/// `uploaded`, not by the value map. Keys that match no active field are
/// left alone and stored as submitted.
pub fn validate_values(
    schema: &[FormFieldDefinition],
    values: &DynamicValues,
    uploaded: &HashSet<String>,
) -> ApiResult<()> {
    let offending: Vec<String> = schema
        .iter()
        .filter(|f| f.is_active)
        .filter(|f| !field_ok(f, values.get(&f.name), uploaded))
        .map(|f| f.name.clone())
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(
            format!("Invalid or missing fields: {}", offending.join(", ")),
            offending,
        ))
    }
}

fn field_ok(field: &FormFieldDefinition, value: Option<&FieldValue>, uploaded: &HashSet<String>) -> bool {
    if field.kind == FieldKind::File {
        return !field.required || uploaded.contains(&field.name);
    }

    let value = match value {
        Some(v) if !v.is_blank() => v,
        _ => return !field.required,
    };

    match field.kind {
        FieldKind::Number => match value {
            FieldValue::Number(n) => n.is_finite(),
            FieldValue::Text(s) => lenient_number(&Value::String(s.clone())).is_some(),
            _ => false,
        },
        FieldKind::Email => match value {
            FieldValue::Text(s) => validator::validate_email(s.trim()),
            _ => false,
        },
        FieldKind::Date => match value {
            FieldValue::Text(s) => parses_as_date(s.trim()),
            _ => false,
        },
        FieldKind::Checkbox => match value {
            FieldValue::Bool(checked) => *checked || !field.required,
            _ => true,
        },
        // No format is enforced for phone numbers
        FieldKind::Phone => !matches!(value, FieldValue::List(_)),
        FieldKind::Text | FieldKind::Textarea | FieldKind::Select | FieldKind::Radio => true,
        FieldKind::File => true,
    }
}

fn parses_as_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok()
}

//! Input contracts handed to the wizard UI

use serde::Serialize;

use super::model::{FieldKind, FieldWidth, FormFieldDefinition};

/// File extensions accepted by upload fields
pub const ACCEPTED_FILE_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];

/// Concrete control for one field
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "control", rename_all = "camelCase")]
pub enum Control {
    #[serde(rename_all = "camelCase")]
    Input { input_type: &'static str },
    TextArea,
    Select { options: Vec<String> },
    Radio { options: Vec<String> },
    Checkbox,
    #[serde(rename_all = "camelCase")]
    FileUpload {
        accept: Vec<&'static str>,
        multiple: bool,
    },
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RenderContract {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub placeholder: Option<String>,
    pub width: FieldWidth,
    pub section: Option<String>,
    #[serde(flatten)]
    pub control: Control,
}

/// Input contract for a field, or `None` for choice fields without options
pub fn render_field(field: &FormFieldDefinition) -> Option<RenderContract> {
    let control = match field.kind {
        FieldKind::Text => Control::Input { input_type: "text" },
        FieldKind::Number => Control::Input { input_type: "number" },
        FieldKind::Email => Control::Input { input_type: "email" },
        FieldKind::Phone => Control::Input { input_type: "tel" },
        FieldKind::Date => Control::Input { input_type: "date" },
        FieldKind::Textarea => Control::TextArea,
        FieldKind::Select if !field.options.is_empty() => Control::Select {
            options: field.options.clone(),
        },
        FieldKind::Radio if !field.options.is_empty() => Control::Radio {
            options: field.options.clone(),
        },
        FieldKind::Select | FieldKind::Radio => {
            tracing::warn!(field = %field.name, "Skipping choice field without options");
            return None;
        }
        FieldKind::Checkbox => Control::Checkbox,
        FieldKind::File => Control::FileUpload {
            accept: ACCEPTED_FILE_EXTENSIONS.to_vec(),
            multiple: true,
        },
    };

    Some(RenderContract {
        name: field.name.clone(),
        label: field.label.clone(),
        required: field.required,
        placeholder: field.placeholder.clone(),
        width: field.width,
        section: field.section.clone(),
        control,
    })
}

/// Render an ordered schema, dropping fields that cannot be rendered
pub fn render_schema(fields: &[FormFieldDefinition]) -> Vec<RenderContract> {
    fields.iter().filter_map(render_field).collect()
}

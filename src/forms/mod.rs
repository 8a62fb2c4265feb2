//! Dynamic application form schema
//!
//! Field definitions are owned by a loan or a loan category. The effective
//! schema of a loan drives both the wizard's render contracts and the
//! server-side validation of submitted values.

pub mod model;
pub mod render;
pub mod schema;
mod service;
pub mod validate;

pub use model::{
    CreateFormFieldRequest, FieldKind, FieldScope, FieldWidth, FormFieldDefinition,
    UpdateFormFieldRequest,
};
pub use render::{render_field, render_schema, Control, RenderContract, ACCEPTED_FILE_EXTENSIONS};
pub use service::FormSchemaService;
pub use validate::{parse_dynamic_values, validate_values, DynamicValues, FieldValue};

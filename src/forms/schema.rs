//! Ordering and merging of field definition sets

use std::collections::HashSet;

use super::model::FormFieldDefinition;

/// Active fields in presentation order: `order` ascending, then insertion
pub fn ordered_active(fields: Vec<FormFieldDefinition>) -> Vec<FormFieldDefinition> {
    let mut fields: Vec<_> = fields.into_iter().filter(|f| f.is_active).collect();
    fields.sort_by_key(|f| (f.order, f.seq));
    fields
}

/// Effective schema of a loan: its category's fields plus its own
///
/// A loan field replaces a category field with the same name.
pub fn effective_schema(
    category_fields: Vec<FormFieldDefinition>,
    loan_fields: Vec<FormFieldDefinition>,
) -> Vec<FormFieldDefinition> {
    let loan_fields = ordered_active(loan_fields);
    let shadowed: HashSet<&str> = loan_fields.iter().map(|f| f.name.as_str()).collect();

    let mut merged: Vec<FormFieldDefinition> = ordered_active(category_fields)
        .into_iter()
        .filter(|f| !shadowed.contains(f.name.as_str()))
        .collect();
    merged.extend(loan_fields);
    // Stable: category fields stay ahead of loan fields at equal order
    merged.sort_by_key(|f| f.order);
    merged
}

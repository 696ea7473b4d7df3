//! API utility functions
//!
//! Contains helper functions used by API handlers for request validation
//! and template resolution.

use crate::error::AppError;
use crate::services::templates::{TemplateCatalog, TemplateVariant};

/// Validate a free-text field
///
/// # Arguments
/// * `field` - Field name used in the error message
/// * `value` - Text to validate
/// * `max_length` - Maximum length in characters
///
/// # Returns
/// * `Ok(())` - Text is valid
/// * `Err(AppError)` - Text is empty or too long
pub fn validate_text(field: &str, value: &str, max_length: usize) -> Result<(), AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} cannot be empty", field)));
    }
    if trimmed.chars().count() > max_length {
        return Err(AppError::InvalidRequest(format!(
            "{} exceeds maximum length of {} characters",
            field, max_length
        )));
    }
    Ok(())
}

/// Validate a text field that may be left empty
///
/// # Returns
/// * `Ok(())` - Text is empty or within the limit
/// * `Err(AppError)` - Text is too long
pub fn validate_optional_text(field: &str, value: &str, max_length: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    validate_text(field, value, max_length)
}

/// Normalize an optional template label
///
/// Missing, blank and `"default"` labels all mean the unlabeled default variant.
pub fn variant_label(template: Option<&str>) -> Option<String> {
    template
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "default")
        .map(str::to_string)
}

/// Resolve selected template names against the catalog
///
/// # Returns
/// * `Ok(Vec<TemplateVariant>)` - Templates in selection order
/// * `Err(AppError)` - Too many selections, duplicates, or an unknown name
pub fn resolve_templates(
    catalog: &TemplateCatalog,
    names: &[String],
    max_variants: usize,
) -> Result<Vec<TemplateVariant>, AppError> {
    if names.len() > max_variants {
        return Err(AppError::InvalidRequest(format!(
            "At most {} templates can be selected",
            max_variants
        )));
    }

    let mut resolved: Vec<TemplateVariant> = Vec::with_capacity(names.len());
    for name in names {
        if resolved.iter().any(|t| &t.name == name) {
            return Err(AppError::InvalidRequest(format!(
                "Template selected twice: {}",
                name
            )));
        }
        let template = catalog
            .find(name)
            .ok_or_else(|| AppError::UnknownTemplate(name.clone()))?;
        resolved.push(template.clone());
    }
    Ok(resolved)
}

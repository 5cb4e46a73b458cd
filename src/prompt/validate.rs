//! Placeholder validation for user-supplied templates

use crate::domain::PromptType;
use crate::error::{Result, StackError};
use crate::prompt::placeholder::scan_placeholders;

/// Check that `template` uses exactly the placeholders `prompt_type` requires.
///
/// Malformed brace syntax fails first. Then every required variable must be
/// present, and finally no placeholder outside the required set may appear.
pub fn validate_template(prompt_type: PromptType, template: &str) -> Result<()> {
    let required = prompt_type.input_variables();
    let found = scan_placeholders(template)?;

    for variable in &required {
        if !found.iter().any(|p| p.name == *variable) {
            return Err(StackError::InvalidTemplate(format!(
                "Input variable {} not found in template",
                variable
            )));
        }
    }

    if let Some(unknown) = found.iter().find(|p| !required.contains(&p.name.as_str())) {
        return Err(StackError::InvalidTemplate(format!(
            "Unknown input variable {}",
            unknown.name
        )));
    }

    Ok(())
}

//! Prompt System - Placeholder scanning, validation and rendering
//!
//! Templates use `{name}` placeholders with `{{`/`}}` escapes. Each prompt
//! type accepts exactly the placeholders listed by `PromptType::input_variables`.

mod placeholder;
mod template;
mod validate;

pub use placeholder::{Placeholder, scan_placeholders};
pub use template::PromptTemplate;
pub use validate::validate_template;

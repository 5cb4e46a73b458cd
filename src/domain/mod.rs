//! Domain types for llmstack
//!
//! - PromptType: the three template kinds and their required placeholders
//! - StackSession: the persisted session prompts belong to
//! - PromptRecord: a session's stored template for one prompt type

pub mod prompt_record;
pub mod prompt_type;
pub mod session;

pub use prompt_record::PromptRecord;
pub use prompt_type::{BASE_INPUT_VARIABLES, PromptType};
pub use session::StackSession;

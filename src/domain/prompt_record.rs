//! Persisted prompt template row

use serde::{Deserialize, Serialize};

use super::PromptType;

/// A session's template for one prompt type.
///
/// At most one record exists per `(session_id, prompt_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub id: i64,

    /// Owning session
    pub session_id: i64,

    #[serde(rename = "type")]
    pub prompt_type: PromptType,

    /// Template text with `{name}` placeholders
    pub template: String,

    /// Open key/value mapping, `{}` on creation
    pub meta_data: serde_json::Value,

    /// Unix timestamp in milliseconds
    pub created_at: i64,

    /// Unix timestamp in milliseconds
    pub updated_at: i64,
}

//! Stack session record

use serde::{Deserialize, Serialize};

/// A persisted working context that prompt records hang off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSession {
    pub id: i64,

    /// Stack this session was opened against
    pub stack_id: i64,

    /// Free-form session metadata (always a JSON object)
    pub meta_data: serde_json::Value,

    /// Unix timestamp in milliseconds
    pub created_at: i64,
}

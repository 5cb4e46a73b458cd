//! Request and response bodies for the service operations

use serde::{Deserialize, Serialize};

use crate::domain::PromptType;

fn default_should_validate() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEngineGetRequest {
    pub session_id: i64,
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    pub query: String,
    #[serde(default = "default_should_validate")]
    pub should_validate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEngineSetRequest {
    pub session_id: i64,
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
    pub template: String,
}

/// Shared by get and set: the resolved template, echoing the key it was resolved for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEngineResponse {
    pub template: String,
    pub session_id: i64,
    #[serde(rename = "type")]
    pub prompt_type: PromptType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCreateRequest {
    #[serde(default)]
    pub stack_id: Option<i64>,
    #[serde(default)]
    pub meta_data: Option<serde_json::Value>,
}

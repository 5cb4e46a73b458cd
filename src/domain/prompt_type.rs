//! Prompt types and the placeholders each one requires

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StackError;

/// Every placeholder a prompt template may use, in canonical order.
pub const BASE_INPUT_VARIABLES: [&str; 3] = ["context", "history", "query"];

/// The three kinds of prompt template a session can customize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromptType {
    /// Chat without retrieved context
    SimpleChatPrompt,
    /// Chat grounded on retrieved context
    ContextualChatPrompt,
    /// Single-shot question answering over retrieved context
    ContextualQaPrompt,
}

impl PromptType {
    /// All variants, in declaration order.
    pub const ALL: [PromptType; 3] = [
        PromptType::SimpleChatPrompt,
        PromptType::ContextualChatPrompt,
        PromptType::ContextualQaPrompt,
    ];

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::SimpleChatPrompt => "SIMPLE_CHAT_PROMPT",
            PromptType::ContextualChatPrompt => "CONTEXTUAL_CHAT_PROMPT",
            PromptType::ContextualQaPrompt => "CONTEXTUAL_QA_PROMPT",
        }
    }

    /// Prompt engine configuration key that holds the template for this type.
    pub fn config_key(&self) -> &'static str {
        match self {
            PromptType::SimpleChatPrompt => "simple_chat_prompt_template",
            PromptType::ContextualChatPrompt => "contextual_chat_prompt_template",
            PromptType::ContextualQaPrompt => "contextual_qa_prompt_template",
        }
    }

    /// The base variable this type does not take, if any.
    fn excluded_variable(&self) -> Option<&'static str> {
        match self {
            PromptType::SimpleChatPrompt => Some("context"),
            PromptType::ContextualChatPrompt => None,
            PromptType::ContextualQaPrompt => Some("history"),
        }
    }

    /// Placeholders a template of this type must contain (and may only contain).
    pub fn input_variables(&self) -> Vec<&'static str> {
        let excluded = self.excluded_variable();
        BASE_INPUT_VARIABLES
            .iter()
            .copied()
            .filter(|v| Some(*v) != excluded)
            .collect()
    }
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PromptType {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromptType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| StackError::InvalidRequest(format!("Unknown prompt type {}", s)))
    }
}

//! Prompt engine - hands out the template a stack should use for a prompt type

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::PromptType;
use crate::error::{Result, StackError};
use crate::prompt::{PromptTemplate, validate_template};
use crate::stack::guard::{GuardVerdict, QueryGuard};

/// `prompt_engine` section of the stack configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptEngineConfig {
    /// Screen queries with the stack's guard before returning a template
    pub should_validate: bool,
    pub simple_chat_prompt_template: Option<String>,
    pub contextual_chat_prompt_template: Option<String>,
    pub contextual_qa_prompt_template: Option<String>,
}

impl Default for PromptEngineConfig {
    fn default() -> Self {
        Self {
            should_validate: true,
            simple_chat_prompt_template: None,
            contextual_chat_prompt_template: None,
            contextual_qa_prompt_template: None,
        }
    }
}

impl PromptEngineConfig {
    fn slot_mut(&mut self, prompt_type: PromptType) -> &mut Option<String> {
        match prompt_type {
            PromptType::SimpleChatPrompt => &mut self.simple_chat_prompt_template,
            PromptType::ContextualChatPrompt => &mut self.contextual_chat_prompt_template,
            PromptType::ContextualQaPrompt => &mut self.contextual_qa_prompt_template,
        }
    }

    /// Configured template text for `prompt_type`, if any
    pub fn template(&self, prompt_type: PromptType) -> Option<&str> {
        match prompt_type {
            PromptType::SimpleChatPrompt => self.simple_chat_prompt_template.as_deref(),
            PromptType::ContextualChatPrompt => self.contextual_chat_prompt_template.as_deref(),
            PromptType::ContextualQaPrompt => self.contextual_qa_prompt_template.as_deref(),
        }
    }

    pub fn set_template(&mut self, prompt_type: PromptType, template: impl Into<String>) {
        *self.slot_mut(prompt_type) = Some(template.into());
    }
}

/// Per-request replacement of one template plus the validation flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEngineOverride {
    pub should_validate: bool,
    pub prompt_type: PromptType,
    pub template: PromptTemplate,
}

impl PromptEngineOverride {
    pub fn apply(self, config: &mut PromptEngineConfig) {
        config.should_validate = self.should_validate;
        config.set_template(self.prompt_type, self.template.template);
    }
}

/// Resolves templates for a stack
pub struct PromptEngine {
    config: PromptEngineConfig,
    guard: Arc<dyn QueryGuard>,
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PromptEngine {
    /// Build an engine, rejecting configured templates with the wrong placeholders.
    pub fn new(config: PromptEngineConfig, guard: Arc<dyn QueryGuard>) -> Result<Self> {
        for prompt_type in PromptType::ALL {
            if let Some(template) = config.template(prompt_type) {
                validate_template(prompt_type, template).map_err(|e| {
                    StackError::Configuration(format!("prompt_engine.{}: {}", prompt_type.config_key(), e))
                })?;
            }
        }
        Ok(Self { config, guard })
    }

    pub fn config(&self) -> &PromptEngineConfig {
        &self.config
    }

    pub fn should_validate(&self) -> bool {
        self.config.should_validate
    }

    /// Template to render `query` with, falling back to the built-in default.
    pub fn get_prompt_template(&self, prompt_type: PromptType, query: &str) -> Result<PromptTemplate> {
        if self.config.should_validate
            && let GuardVerdict::Reject(reason) = self.guard.inspect(query)
        {
            debug!("Rejected query for {}: {}", prompt_type, reason);
            return Err(StackError::UnsafeQuery(reason));
        }

        Ok(match self.config.template(prompt_type) {
            Some(template) => PromptTemplate::for_type(prompt_type, template),
            None => PromptTemplate::default_for(prompt_type),
        })
    }
}

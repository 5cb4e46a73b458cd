//! Prompt templates and the built-in defaults for each prompt type

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::PromptType;
use crate::error::{Result, StackError};
use crate::prompt::placeholder::{Segment, segments};

const SIMPLE_CHAT_TEMPLATE: &str = "The following is a friendly conversation between a human and an AI. \
The AI is talkative and provides lots of specific details. \
If the AI does not know the answer to a question, it truthfully says it does not know.

Current conversation:
{history}
Human: {query}
AI:";

const CONTEXTUAL_CHAT_TEMPLATE: &str = "The following is a friendly conversation between a human and an AI. \
Use the context below to answer. \
If the answer is not in the context, say that you do not know instead of making something up.

Context:
{context}

Current conversation:
{history}
Human: {query}
AI:";

const CONTEXTUAL_QA_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}

Question: {query}
Helpful Answer:";

/// A template string plus the variables it is filled with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub template: String,
    pub input_variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, input_variables: Vec<String>) -> Self {
        Self {
            template: template.into(),
            input_variables,
        }
    }

    /// Template using the input variables `prompt_type` requires
    pub fn for_type(prompt_type: PromptType, template: impl Into<String>) -> Self {
        Self::new(
            template,
            prompt_type.input_variables().into_iter().map(String::from).collect(),
        )
    }

    /// The built-in template for `prompt_type`
    pub fn default_for(prompt_type: PromptType) -> Self {
        let text = match prompt_type {
            PromptType::SimpleChatPrompt => SIMPLE_CHAT_TEMPLATE,
            PromptType::ContextualChatPrompt => CONTEXTUAL_CHAT_TEMPLATE,
            PromptType::ContextualQaPrompt => CONTEXTUAL_QA_TEMPLATE,
        };
        Self::for_type(prompt_type, text)
    }

    /// Substitute every placeholder with its value from `values`.
    pub fn format(&self, values: &HashMap<String, String>) -> Result<String> {
        let mut out = String::with_capacity(self.template.len());
        for segment in segments(&self.template)? {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder { name, .. } => {
                    let value = values.get(name).ok_or_else(|| {
                        StackError::InvalidTemplate(format!("Missing value for input variable {}", name))
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

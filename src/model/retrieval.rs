//! Question answering over retrieved context

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::domain::PromptType;
use crate::error::{Result, StackError};
use crate::model::{ChatBackend, Model, ModelOutput};
use crate::prompt::{PromptTemplate, validate_template};
use crate::retriever::Retriever;
use crate::stack::PromptEngineConfig;

const SYSTEM_PROMPT: &str = "You answer questions using only the supplied context.";

/// Retrieves context for a query, fills the QA template and asks the backend
pub struct RetrievalModel {
    backend: Arc<dyn ChatBackend>,
    retriever: Retriever,
    template: PromptTemplate,
}

impl RetrievalModel {
    /// Uses the configured `contextual_qa_prompt_template` or the built-in one
    pub fn new(backend: Arc<dyn ChatBackend>, retriever: Retriever, prompt_engine: &PromptEngineConfig) -> Result<Self> {
        let prompt_type = PromptType::ContextualQaPrompt;
        let template = match prompt_engine.template(prompt_type) {
            Some(text) => {
                validate_template(prompt_type, text)
                    .map_err(|e| StackError::Configuration(format!("prompt_engine.{}: {}", prompt_type.config_key(), e)))?;
                PromptTemplate::for_type(prompt_type, text)
            }
            None => PromptTemplate::default_for(prompt_type),
        };
        Ok(Self {
            backend,
            retriever,
            template,
        })
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}

#[async_trait]
impl Model for RetrievalModel {
    async fn predict(&self, query: &str) -> Result<ModelOutput> {
        let query = query.trim();
        if query.is_empty() {
            return Err(StackError::InvalidRequest("Query must not be empty".to_string()));
        }

        let retriever = self.retriever.clone();
        let owned_query = query.to_string();
        let source_documents = tokio::task::spawn_blocking(move || retriever.retrieve(&owned_query)).await??;
        let context = source_documents
            .iter()
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let values = HashMap::from([
            ("context".to_string(), context),
            ("query".to_string(), query.to_string()),
        ]);
        let prompt = self.template.format(&values)?;

        info!(
            "Answering with {} using {} context documents",
            self.backend.model(),
            source_documents.len()
        );
        let result = self.backend.complete(SYSTEM_PROMPT, &prompt).await?;
        Ok(ModelOutput {
            result,
            source_documents,
        })
    }
}

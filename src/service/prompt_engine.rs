//! Prompt engine service - per-session prompt template get/set

use std::sync::Arc;

use log::info;

use crate::error::{Result, StackError};
use crate::prompt::{PromptTemplate, validate_template};
use crate::service::models::{PromptEngineGetRequest, PromptEngineResponse, PromptEngineSetRequest};
use crate::stack::{PromptEngineOverride, StackConfig, StackFactory};
use crate::store::PromptStore;

/// Serves prompt templates stored per `(session, type)`
pub struct PromptEngineService {
    store: Arc<PromptStore>,
    factory: Arc<dyn StackFactory>,
    config: StackConfig,
}

impl PromptEngineService {
    pub fn new(store: Arc<PromptStore>, factory: Arc<dyn StackFactory>, config: StackConfig) -> Self {
        Self { store, factory, config }
    }

    fn not_found(session_id: i64) -> StackError {
        StackError::NotFound(format!("Session {} not found", session_id))
    }

    /// Resolve the template a session's stack uses for `data.prompt_type`.
    ///
    /// A stored template overrides the stack's configured one. Never writes.
    pub fn get_prompt(&self, data: &PromptEngineGetRequest) -> Result<PromptEngineResponse> {
        let (session, record) = self
            .store
            .find_session_prompt(data.session_id, data.prompt_type)?
            .ok_or_else(|| Self::not_found(data.session_id))?;

        let override_config = record.map(|record| PromptEngineOverride {
            should_validate: data.should_validate,
            prompt_type: data.prompt_type,
            template: PromptTemplate::for_type(data.prompt_type, record.template),
        });

        let stack = self.factory.build(&self.config, &session, override_config)?;
        let prompt = stack
            .prompt_engine
            .get_prompt_template(data.prompt_type, &data.query)?;

        Ok(PromptEngineResponse {
            template: prompt.template,
            session_id: data.session_id,
            prompt_type: data.prompt_type,
        })
    }

    /// Validate and store a session's template for `data.prompt_type`.
    pub fn set_prompt(&self, data: &PromptEngineSetRequest) -> Result<PromptEngineResponse> {
        let record = self
            .store
            .upsert_session_prompt(data.session_id, data.prompt_type, &data.template, || {
                validate_template(data.prompt_type, &data.template)
            })?
            .ok_or_else(|| Self::not_found(data.session_id))?;
        info!("Stored {} template for session {}", data.prompt_type, data.session_id);

        Ok(PromptEngineResponse {
            template: record.template,
            session_id: data.session_id,
            prompt_type: data.prompt_type,
        })
    }
}

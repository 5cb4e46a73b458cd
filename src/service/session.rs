//! Session service - create and look up stack sessions

use std::sync::Arc;

use log::info;

use crate::domain::StackSession;
use crate::error::{Result, StackError};
use crate::service::models::SessionCreateRequest;
use crate::store::PromptStore;

/// Stack used when a session is created without one
pub const DEFAULT_STACK_ID: i64 = 1;

pub struct SessionService {
    store: Arc<PromptStore>,
}

impl SessionService {
    pub fn new(store: Arc<PromptStore>) -> Self {
        Self { store }
    }

    pub fn create_session(&self, data: &SessionCreateRequest) -> Result<StackSession> {
        let meta_data = match &data.meta_data {
            None | Some(serde_json::Value::Null) => serde_json::json!({}),
            Some(value @ serde_json::Value::Object(_)) => value.clone(),
            Some(_) => {
                return Err(StackError::InvalidRequest(
                    "Session meta_data must be a JSON object".to_string(),
                ));
            }
        };
        let session = self
            .store
            .create_session(data.stack_id.unwrap_or(DEFAULT_STACK_ID), meta_data)?;
        info!("Created session {} on stack {}", session.id, session.stack_id);
        Ok(session)
    }

    pub fn get_session(&self, session_id: i64) -> Result<StackSession> {
        self.store
            .get_session(session_id)?
            .ok_or_else(|| StackError::NotFound(format!("Session {} not found", session_id)))
    }

    pub fn list_sessions(&self) -> Result<Vec<StackSession>> {
        self.store.list_sessions()
    }
}

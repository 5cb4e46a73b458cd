//! Stack - the aggregate a session's requests are served by
//!
//! A stack is assembled per request by a [`StackFactory`] from the explicit
//! [`StackConfig`], the session it serves, and an optional prompt engine
//! override carrying the session's stored template.

mod engine;
mod guard;

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::StackSession;
use crate::error::Result;

pub use engine::{PromptEngine, PromptEngineConfig, PromptEngineOverride};
pub use guard::{DEFAULT_BLOCKED_PATTERNS, GuardVerdict, PatternGuard, QueryGuard};

/// Configuration a stack is built from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub prompt_engine: PromptEngineConfig,
}

/// Components resolved for one session
#[derive(Debug)]
pub struct Stack {
    pub prompt_engine: PromptEngine,
}

/// Builds the stack serving a session
pub trait StackFactory: Send + Sync {
    fn build(
        &self,
        config: &StackConfig,
        session: &StackSession,
        override_config: Option<PromptEngineOverride>,
    ) -> Result<Stack>;
}

/// Builds stacks whose prompt engine screens queries with a shared guard
pub struct DefaultStackFactory {
    guard: Arc<dyn QueryGuard>,
}

impl DefaultStackFactory {
    /// Factory using the [`PatternGuard::standard`] guard
    pub fn new() -> Result<Self> {
        Ok(Self::with_guard(Arc::new(PatternGuard::standard()?)))
    }

    pub fn with_guard(guard: Arc<dyn QueryGuard>) -> Self {
        Self { guard }
    }
}

impl StackFactory for DefaultStackFactory {
    fn build(
        &self,
        config: &StackConfig,
        session: &StackSession,
        override_config: Option<PromptEngineOverride>,
    ) -> Result<Stack> {
        let mut engine_config = config.prompt_engine.clone();
        if let Some(override_config) = override_config {
            debug!(
                "Session {} overrides {}",
                session.id,
                override_config.prompt_type.config_key()
            );
            override_config.apply(&mut engine_config);
        }
        Ok(Stack {
            prompt_engine: PromptEngine::new(engine_config, self.guard.clone())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PromptType;
    use crate::prompt::PromptTemplate;

    fn session() -> StackSession {
        StackSession {
            id: 1,
            stack_id: 1,
            meta_data: serde_json::json!({}),
            created_at: 0,
        }
    }

    #[test]
    fn test_build_without_override_uses_config() {
        let factory = DefaultStackFactory::new().unwrap();
        let config = StackConfig::default();
        let stack = factory.build(&config, &session(), None).unwrap();
        assert_eq!(stack.prompt_engine.config(), &config.prompt_engine);
    }

    #[test]
    fn test_build_with_override_leaves_config_untouched() {
        let factory = DefaultStackFactory::new().unwrap();
        let config = StackConfig::default();
        let override_config = PromptEngineOverride {
            should_validate: false,
            prompt_type: PromptType::ContextualChatPrompt,
            template: PromptTemplate::for_type(PromptType::ContextualChatPrompt, "{context}{history}{query}"),
        };
        let stack = factory.build(&config, &session(), Some(override_config)).unwrap();

        assert!(!stack.prompt_engine.should_validate());
        assert_eq!(
            stack.prompt_engine.config().template(PromptType::ContextualChatPrompt),
            Some("{context}{history}{query}")
        );
        assert!(config.prompt_engine.should_validate);
        assert!(config.prompt_engine.template(PromptType::ContextualChatPrompt).is_none());
    }

    #[test]
    fn test_stack_config_from_yaml() {
        let config: StackConfig = serde_yaml::from_str(
            "prompt_engine:\n  should_validate: false\n  contextual_qa_prompt_template: \"{context} {query}\"\n",
        )
        .unwrap();
        assert!(!config.prompt_engine.should_validate);
        assert_eq!(
            config.prompt_engine.template(PromptType::ContextualQaPrompt),
            Some("{context} {query}")
        );
    }
}

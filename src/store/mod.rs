//! Storage layer for llmstack.
//!
//! Sessions and their prompt templates live in one SQLite database.
//!
//! # Example
//!
//! ```ignore
//! use llmstack::domain::PromptType;
//! use llmstack::store::PromptStore;
//!
//! let store = PromptStore::open_at(Path::new("/var/lib/llmstack"))?;
//! let session = store.create_session(1, serde_json::json!({}))?;
//! store.upsert_prompt(session.id, PromptType::ContextualQaPrompt, "{context} -> {query}")?;
//! ```

mod prompt_store;

pub use prompt_store::{DB_FILE, PromptStore};

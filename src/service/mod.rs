//! Services behind the HTTP API
//!
//! Each call opens its own storage transaction through [`PromptStore`](crate::store::PromptStore);
//! nothing is cached between requests.

pub mod models;
mod prompt_engine;
mod session;

pub use models::{PromptEngineGetRequest, PromptEngineResponse, PromptEngineSetRequest, SessionCreateRequest};
pub use prompt_engine::PromptEngineService;
pub use session::{DEFAULT_STACK_ID, SessionService};

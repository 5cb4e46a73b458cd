//! LLM Stack - build and serve retrieval-augmented LLM applications
//!
//! Sessions customize the prompt templates their stack uses through the
//! prompt engine service. Templates are validated against the placeholders
//! each prompt type requires before they are stored.

pub mod airbyte;
pub mod config;
pub mod domain;
pub mod error;
pub mod etl;
pub mod id;
pub mod model;
pub mod prompt;
pub mod retriever;
pub mod server;
pub mod service;
pub mod stack;
pub mod store;
pub mod vectordb;

pub use error::{Result, StackError};

//! Language models the stack can serve
//!
//! Prebuilt models are looked up by name in [`AVAILABLE_MODELS`]. The
//! [`CUSTOM_MODEL_KEY_NAME`] entry points at any OpenAI-compatible endpoint
//! described in the `model` section of the config.

mod client;
mod retrieval;
mod server;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{Config, MODEL_CONFIG_KEY};
use crate::error::{Result, StackError};
use crate::retriever::Retriever;
use crate::vectordb::Document;

pub use client::{ChatBackend, OpenAiCompatibleClient, OpenAiConfig};
pub use retrieval::RetrievalModel;
pub use server::{PredictRequest, model_router, run_http_server};

/// Model name that selects a user-described endpoint
pub const CUSTOM_MODEL_KEY_NAME: &str = "custom";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GPT4ALL_BASE_URL: &str = "http://localhost:4891/v1";

/// Prebuilt models, in the order they are listed
pub const AVAILABLE_MODELS: [(&str, &str); 2] = [
    ("gpt3.5", "OpenAI gpt-3.5-turbo"),
    ("gpt4all", "Local GPT4All server (OpenAI-compatible API on port 4891)"),
];

pub fn list_supported_models() -> Vec<&'static str> {
    AVAILABLE_MODELS.iter().map(|(name, _)| *name).collect()
}

/// A prediction and the documents it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOutput {
    pub result: String,
    pub source_documents: Vec<Document>,
}

#[async_trait]
pub trait Model: Send + Sync {
    async fn predict(&self, query: &str) -> Result<ModelOutput>;
}

/// `fields` of the `model` section
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelFields {
    base_url: Option<String>,
    model_name: Option<String>,
    #[serde(alias = "openai_api_key")]
    api_key: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

impl ModelFields {
    fn from_config(config: &Config) -> Result<Self> {
        match config.section(MODEL_CONFIG_KEY) {
            Ok(section) => section.fields_as(),
            Err(_) => Ok(Self::default()),
        }
    }

    fn into_openai_config(self, base_url: String, model: String) -> OpenAiConfig {
        let mut config = OpenAiConfig::new(base_url, model);
        config.api_key = self.api_key;
        config.temperature = self.temperature;
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

fn prebuilt_backend(name: &str, fields: ModelFields) -> Result<OpenAiConfig> {
    match name {
        "gpt3.5" => {
            let base_url = fields.base_url.clone().unwrap_or_else(|| OPENAI_BASE_URL.to_string());
            let model = fields.model_name.clone().unwrap_or_else(|| "gpt-3.5-turbo".to_string());
            let mut openai = fields.into_openai_config(base_url, model);
            if openai.api_key.is_none() {
                openai.api_key = Some(
                    std::env::var("OPENAI_API_KEY")
                        .map_err(|_| StackError::Configuration("OPENAI_API_KEY not set".to_string()))?,
                );
            }
            Ok(openai)
        }
        "gpt4all" => {
            let base_url = fields.base_url.clone().unwrap_or_else(|| GPT4ALL_BASE_URL.to_string());
            let model = fields.model_name.clone().unwrap_or_else(|| "gpt4all".to_string());
            Ok(fields.into_openai_config(base_url, model))
        }
        other => Err(StackError::Configuration(format!(
            "Unknown prebuilt model provided: {}. Run list-models to see the supported models",
            other
        ))),
    }
}

/// Build the prebuilt model `name`, answering over `retriever`
pub fn get_model(name: &str, config: &Config, retriever: Retriever) -> Result<Arc<dyn Model>> {
    let openai = prebuilt_backend(name, ModelFields::from_config(config)?)?;
    info!("Loading prebuilt model {} ({})", name, openai.model);
    let backend = Arc::new(OpenAiCompatibleClient::new(openai)?);
    Ok(Arc::new(RetrievalModel::new(backend, retriever, &config.prompt_engine)?))
}

/// Build the user-described model from the `model` section
pub fn build_custom_model(config: &Config, retriever: Retriever) -> Result<Arc<dyn Model>> {
    let fields: ModelFields = config.section(MODEL_CONFIG_KEY)?.fields_as()?;
    let base_url = fields
        .base_url
        .clone()
        .ok_or_else(|| StackError::Configuration("Custom model requires model.fields.base_url".to_string()))?;
    let model_name = fields
        .model_name
        .clone()
        .ok_or_else(|| StackError::Configuration("Custom model requires model.fields.model_name".to_string()))?;

    info!("Loading custom model {} from {}", model_name, base_url);
    let backend = Arc::new(OpenAiCompatibleClient::new(fields.into_openai_config(base_url, model_name))?);
    Ok(Arc::new(RetrievalModel::new(backend, retriever, &config.prompt_engine)?))
}

/// Build the custom model and serve it
pub async fn run_custom_model(config: &Config, retriever: Retriever) -> Result<()> {
    let model = build_custom_model(config, retriever)?;
    run_http_server(model, &config.server).await
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectordb::LocalVectorDb;

    fn retriever() -> Retriever {
        Retriever::new(Arc::new(LocalVectorDb::open_in_memory().unwrap()), 4)
    }

    #[test]
    fn test_list_supported_models_in_order() {
        assert_eq!(list_supported_models(), vec!["gpt3.5", "gpt4all"]);
        assert!(!list_supported_models().contains(&CUSTOM_MODEL_KEY_NAME));
    }

    #[test]
    fn test_gpt4all_defaults() {
        let openai = prebuilt_backend("gpt4all", ModelFields::default()).unwrap();
        assert_eq!(openai.base_url, GPT4ALL_BASE_URL);
        assert!(openai.api_key.is_none());
    }

    #[test]
    fn test_gpt35_with_configured_key() {
        let fields = ModelFields {
            api_key: Some("sk-test".to_string()),
            temperature: Some(0.1),
            ..Default::default()
        };
        let openai = prebuilt_backend("gpt3.5", fields).unwrap();
        assert_eq!(openai.base_url, OPENAI_BASE_URL);
        assert_eq!(openai.model, "gpt-3.5-turbo");
        assert_eq!(openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(openai.temperature, Some(0.1));
    }

    #[test]
    fn test_openai_api_key_field_read_from_config() {
        let config = Config::from_yaml_str(
            "model: { name: gpt3.5, fields: { openai_api_key: sk-from-config, temperature: 0.0 } }\n",
        )
        .unwrap();
        let openai = prebuilt_backend("gpt3.5", ModelFields::from_config(&config).unwrap()).unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("sk-from-config"));
        assert_eq!(openai.temperature, Some(0.0));
        assert!(get_model("gpt3.5", &config, retriever()).is_ok());
    }

    #[test]
    fn test_get_model_unknown_name() {
        let err = get_model("llama", &Config::default(), retriever()).err().unwrap();
        assert!(matches!(err, StackError::Configuration(_)));
        assert!(err.to_string().contains("Unknown prebuilt model provided: llama"));
    }

    #[test]
    fn test_get_model_gpt4all() {
        let config = Config::from_yaml_str("model:\n  name: gpt4all\n  fields:\n    timeout_secs: 5\n").unwrap();
        assert!(get_model("gpt4all", &config, retriever()).is_ok());
    }

    #[test]
    fn test_custom_model_requires_fields() {
        let config = Config::from_yaml_str("model:\n  name: custom\n  fields:\n    base_url: http://localhost:9000/v1\n").unwrap();
        let err = build_custom_model(&config, retriever()).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Configuration error: Custom model requires model.fields.model_name"
        );
    }

    #[test]
    fn test_custom_model_built() {
        let config = Config::from_yaml_str(
            "model:\n  name: custom\n  fields:\n    base_url: http://localhost:9000/v1\n    model_name: mistral\n",
        )
        .unwrap();
        assert!(build_custom_model(&config, retriever()).is_ok());
    }
}

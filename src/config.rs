use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StackError};
use crate::stack::{PromptEngineConfig, StackConfig};

pub const MODEL_CONFIG_KEY: &str = "model";
pub const VECTORDB_CONFIG_KEY: &str = "vectordb";
pub const RETRIEVER_CONFIG_KEY: &str = "retriever";
pub const ETL_CONFIG_KEY: &str = "etl";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: Option<ComponentConfig>,
    pub vectordb: Option<ComponentConfig>,
    pub retriever: Option<ComponentConfig>,
    pub etl: Option<ComponentConfig>,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub prompt_engine: PromptEngineConfig,
}

/// A pluggable component: which implementation (`name`) and its settings (`fields`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub name: String,
    #[serde(default)]
    pub fields: serde_yaml::Mapping,
}

impl ComponentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: serde_yaml::Mapping::new(),
        }
    }

    /// Deserialize `fields` into the component's typed settings
    pub fn fields_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_yaml::from_value(serde_yaml::Value::Mapping(self.fields.clone()))
            .map_err(|e| StackError::Configuration(format!("Invalid fields for '{}': {}", self.name, e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8082,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(env!("CARGO_PKG_NAME"))
                .join(crate::store::DB_FILE),
        }
    }
}

/// Replace a leading `~` with the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            StackError::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config = Self::from_yaml_str(&content).map_err(|e| {
            StackError::Configuration(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Parse a YAML (or JSON) config document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.storage.database = expand_home(&config.storage.database);
        Ok(config)
    }

    /// Component section for `key`
    pub fn section(&self, key: &str) -> Result<&ComponentConfig> {
        let section = match key {
            MODEL_CONFIG_KEY => self.model.as_ref(),
            VECTORDB_CONFIG_KEY => self.vectordb.as_ref(),
            RETRIEVER_CONFIG_KEY => self.retriever.as_ref(),
            ETL_CONFIG_KEY => self.etl.as_ref(),
            _ => None,
        };
        section.ok_or_else(|| StackError::Configuration(format!("Missing '{}' section in config", key)))
    }

    /// Implementation name configured for section `key`
    pub fn section_name(&self, key: &str) -> Result<&str> {
        Ok(self.section(key)?.name.trim())
    }

    /// The explicit configuration stacks are built from
    pub fn stack_config(&self) -> StackConfig {
        StackConfig {
            prompt_engine: self.prompt_engine.clone(),
        }
    }
}

//! Vector databases that hold document chunks for retrieval

mod local;

use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{Config, VECTORDB_CONFIG_KEY, expand_home};
use crate::error::{Result, StackError};

pub use local::LocalVectorDb;

const VECTORS_FILE: &str = "vectors.db";

/// A chunk of text plus where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: serde_json::Value,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A search hit with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f64,
}

pub trait VectorDb: Send + Sync {
    /// Store documents, returning how many were added
    fn add_documents(&self, documents: &[Document]) -> Result<usize>;

    /// Up to `k` documents most similar to `query`, best first
    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>>;

    fn count(&self) -> Result<usize>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocalFields {
    path: Option<PathBuf>,
}

fn default_vectors_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(env!("CARGO_PKG_NAME"))
        .join(VECTORS_FILE)
}

/// Build the vector database named in the `vectordb` section
pub fn get_vectordb(config: &Config) -> Result<Arc<dyn VectorDb>> {
    let section = config.section(VECTORDB_CONFIG_KEY)?;
    match section.name.trim() {
        "local" => {
            let fields: LocalFields = section.fields_as()?;
            let path = fields
                .path
                .map(|p| expand_home(&p))
                .unwrap_or_else(default_vectors_path);
            info!("Using local vector database at {}", path.display());
            Ok(Arc::new(LocalVectorDb::open(&path)?))
        }
        other => Err(StackError::Configuration(format!("Unknown vectordb '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_local_vectordb() {
        let temp = TempDir::new().unwrap();
        let yaml = format!(
            "vectordb:\n  name: local\n  fields:\n    path: {}\n",
            temp.path().join("v.db").display()
        );
        let config = Config::from_yaml_str(&yaml).unwrap();
        let db = get_vectordb(&config).unwrap();
        assert_eq!(db.count().unwrap(), 0);
        assert!(temp.path().join("v.db").exists());
    }

    #[test]
    fn test_unknown_vectordb() {
        let config = Config::from_yaml_str("vectordb:\n  name: chroma\n").unwrap();
        let err = get_vectordb(&config).err().unwrap();
        assert_eq!(err.to_string(), "Configuration error: Unknown vectordb 'chroma'");
    }

    #[test]
    fn test_missing_section() {
        let err = get_vectordb(&Config::default()).err().unwrap();
        assert!(matches!(err, StackError::Configuration(_)));
    }
}

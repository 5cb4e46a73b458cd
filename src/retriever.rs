//! Retrievers fetch the chunks a model answers from

use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use crate::config::{Config, RETRIEVER_CONFIG_KEY};
use crate::error::{Result, StackError};
use crate::vectordb::{Document, VectorDb};

pub const DEFAULT_K: usize = 4;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SimilarityFields {
    k: usize,
}

impl Default for SimilarityFields {
    fn default() -> Self {
        Self { k: DEFAULT_K }
    }
}

/// Similarity search over a vector database
#[derive(Clone)]
pub struct Retriever {
    vectordb: Arc<dyn VectorDb>,
    k: usize,
}

impl Retriever {
    pub fn new(vectordb: Arc<dyn VectorDb>, k: usize) -> Self {
        Self { vectordb, k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// The `k` documents closest to `query`
    pub fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let hits = self.vectordb.similarity_search(query, self.k)?;
        debug!("Retrieved {} documents for query", hits.len());
        Ok(hits.into_iter().map(|hit| hit.document).collect())
    }
}

/// Build the retriever named in the `retriever` section
pub fn get_retriever(config: &Config, vectordb: Arc<dyn VectorDb>) -> Result<Retriever> {
    let section = config.section(RETRIEVER_CONFIG_KEY)?;
    match section.name.trim() {
        "similarity" => {
            let fields: SimilarityFields = section.fields_as()?;
            if fields.k == 0 {
                return Err(StackError::Configuration("retriever.fields.k must be positive".to_string()));
            }
            Ok(Retriever::new(vectordb, fields.k))
        }
        other => Err(StackError::Configuration(format!("Unknown retriever '{}'", other))),
    }
}

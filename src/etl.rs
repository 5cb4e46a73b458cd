//! ETL - load source files into the vector database as overlapping chunks

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{Config, ETL_CONFIG_KEY, expand_home};
use crate::error::{Result, StackError};
use crate::vectordb::{Document, VectorDb, get_vectordb};

const DEFAULT_PATTERN: &str = "**/*.txt";
const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Files read and chunks written by one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EtlReport {
    pub files: usize,
    pub chunks: usize,
}

/// `fields` of a `directory` etl section
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryLoaderConfig {
    pub source: PathBuf,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl DirectoryLoaderConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            pattern: default_pattern(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Split `text` into windows of `size` characters, each overlapping the previous by `overlap`
pub fn split_chunks(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = start.saturating_add(size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Reads matching files under a directory and stores them chunk by chunk
pub struct DirectoryLoader {
    config: DirectoryLoaderConfig,
}

impl DirectoryLoader {
    pub fn new(mut config: DirectoryLoaderConfig) -> Result<Self> {
        config.source = expand_home(&config.source);
        if config.chunk_size == 0 {
            return Err(StackError::Configuration("etl chunk_size must be positive".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(StackError::Configuration(format!(
                "etl chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if !config.source.is_dir() {
            return Err(StackError::Configuration(format!(
                "etl source {} is not a directory",
                config.source.display()
            )));
        }
        Ok(Self { config })
    }

    fn matching_files(&self) -> Result<Vec<PathBuf>> {
        let full_pattern = self.config.source.join(&self.config.pattern);
        let mut files: Vec<PathBuf> = glob::glob(&full_pattern.to_string_lossy())
            .map_err(|e| StackError::Configuration(format!("Invalid etl pattern '{}': {}", self.config.pattern, e)))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    pub fn load(&self, vectordb: &dyn VectorDb) -> Result<EtlReport> {
        let mut report = EtlReport::default();
        for path in self.matching_files()? {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    warn!("Skipping non UTF-8 file {}", path.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let source = path.display().to_string();
            let documents: Vec<Document> = split_chunks(&text, self.config.chunk_size, self.config.chunk_overlap)
                .into_iter()
                .enumerate()
                .map(|(n, chunk)| Document::new(chunk, json!({"source": source, "chunk": n})))
                .collect();

            debug!("{}: {} chunks", source, documents.len());
            report.chunks += vectordb.add_documents(&documents)?;
            report.files += 1;
        }
        Ok(report)
    }
}

/// Run the loader named in the `etl` section against the configured vector database
pub fn run_etl_loader(config: &Config) -> Result<EtlReport> {
    let section = config.section(ETL_CONFIG_KEY)?;
    let loader = match section.name.trim() {
        "directory" => DirectoryLoader::new(section.fields_as()?)?,
        other => return Err(StackError::Configuration(format!("Unknown etl loader '{}'", other))),
    };
    let vectordb = get_vectordb(config)?;
    let report = loader.load(vectordb.as_ref())?;
    info!("ETL loaded {} chunks from {} files", report.chunks, report.files);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectordb::LocalVectorDb;
    use tempfile::TempDir;

    #[test]
    fn test_split_chunks_overlap() {
        assert_eq!(split_chunks("abcdefghij", 4, 1), vec!["abcd", "defg", "ghij"]);
        assert_eq!(split_chunks("abcde", 10, 2), vec!["abcde"]);
        assert!(split_chunks("", 4, 1).is_empty());
    }

    #[test]
    fn test_split_chunks_counts_chars() {
        let chunks = split_chunks("héllo wörld", 5, 0);
        assert_eq!(chunks, vec!["héllo", " wörl", "d"]);
    }

    #[test]
    fn test_split_chunks_huge_size() {
        assert_eq!(split_chunks("abc", usize::MAX, 0), vec!["abc"]);
        assert_eq!(split_chunks("abcdef", usize::MAX, usize::MAX - 1), vec!["abcdef"]);
    }

    #[test]
    fn test_source_expands_home() {
        let Some(home) = dirs::home_dir().filter(|h| h.is_dir()) else {
            return;
        };
        let loader = DirectoryLoader::new(DirectoryLoaderConfig::new("~")).unwrap();
        assert_eq!(loader.config.source, home);
    }

    #[test]
    fn test_overlap_must_be_smaller() {
        let temp = TempDir::new().unwrap();
        let mut config = DirectoryLoaderConfig::new(temp.path());
        config.chunk_size = 100;
        config.chunk_overlap = 100;
        let err = DirectoryLoader::new(config).err().unwrap();
        assert!(err.to_string().contains("must be less than chunk_size"));
    }

    #[test]
    fn test_missing_source_dir() {
        let err = DirectoryLoader::new(DirectoryLoaderConfig::new("/nonexistent/docs")).err().unwrap();
        assert!(matches!(err, StackError::Configuration(_)));
    }

    #[test]
    fn test_load_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("a.txt"), "x".repeat(25)).unwrap();
        fs::write(temp.path().join("nested").join("b.txt"), "short").unwrap();
        fs::write(temp.path().join("ignored.md"), "not loaded").unwrap();

        let mut config = DirectoryLoaderConfig::new(temp.path());
        config.chunk_size = 10;
        config.chunk_overlap = 2;
        let db = LocalVectorDb::open_in_memory().unwrap();
        let report = DirectoryLoader::new(config).unwrap().load(&db).unwrap();

        // 25 chars at step 8: 0..10, 8..18, 16..25
        assert_eq!(report, EtlReport { files: 2, chunks: 4 });
        assert_eq!(db.count().unwrap(), 4);
    }

    #[test]
    fn test_chunk_metadata() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("doc.txt"), "retrieval augmented generation").unwrap();
        let db = LocalVectorDb::open_in_memory().unwrap();
        DirectoryLoader::new(DirectoryLoaderConfig::new(temp.path()))
            .unwrap()
            .load(&db)
            .unwrap();

        let hits = db.similarity_search("generation", 1).unwrap();
        let metadata = &hits[0].document.metadata;
        assert_eq!(metadata["chunk"], 0);
        assert!(metadata["source"].as_str().unwrap().ends_with("doc.txt"));
    }

    #[test]
    fn test_run_etl_loader_from_config() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("one.txt"), "first document").unwrap();
        let yaml = format!(
            "etl:\n  name: directory\n  fields:\n    source: {}\nvectordb:\n  name: local\n  fields:\n    path: {}\n",
            docs.display(),
            temp.path().join("v.db").display()
        );
        let report = run_etl_loader(&Config::from_yaml_str(&yaml).unwrap()).unwrap();
        assert_eq!(report, EtlReport { files: 1, chunks: 1 });
    }

    #[test]
    fn test_unknown_loader() {
        let config = Config::from_yaml_str("etl:\n  name: airbyte\n").unwrap();
        let err = run_etl_loader(&config).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Unknown etl loader 'airbyte'");
    }
}

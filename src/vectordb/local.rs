//! SQLite-backed vector store using sparse term-frequency vectors

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use log::debug;
use rusqlite::{Connection, params};

use crate::error::Result;
use crate::vectordb::{Document, ScoredDocument, VectorDb};

type TermVector = HashMap<String, f64>;

/// Lowercased alphanumeric tokens
pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn term_vector(text: &str) -> TermVector {
    let mut vector = TermVector::new();
    for token in tokenize(text) {
        *vector.entry(token).or_insert(0.0) += 1.0;
    }
    vector
}

fn norm(vector: &TermVector) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}

fn cosine(query: &TermVector, query_norm: f64, doc: &TermVector, doc_norm: f64) -> f64 {
    if query_norm == 0.0 || doc_norm == 0.0 {
        return 0.0;
    }
    let dot: f64 = query
        .iter()
        .filter_map(|(term, w)| doc.get(term).map(|d| w * d))
        .sum();
    dot / (query_norm * doc_norm)
}

/// Vector store kept in a local SQLite file
pub struct LocalVectorDb {
    db: Mutex<Connection>,
}

impl LocalVectorDb {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!("Opening local vector store at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(db: Connection) -> Result<Self> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                vector TEXT NOT NULL,
                norm REAL NOT NULL
            );
            "#,
        )?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl VectorDb for LocalVectorDb {
    fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        let mut db = self.lock();
        let tx = db.transaction()?;
        for doc in documents {
            let vector = term_vector(&doc.content);
            tx.execute(
                "INSERT INTO documents (content, metadata, vector, norm) VALUES (?1, ?2, ?3, ?4)",
                params![
                    doc.content,
                    serde_json::to_string(&doc.metadata)?,
                    serde_json::to_string(&vector)?,
                    norm(&vector),
                ],
            )?;
        }
        tx.commit()?;
        Ok(documents.len())
    }

    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let query_vector = term_vector(query);
        let query_norm = norm(&query_vector);
        if k == 0 || query_norm == 0.0 {
            return Ok(Vec::new());
        }

        let db = self.lock();
        let mut stmt = db.prepare("SELECT content, metadata, vector, norm FROM documents ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (content, metadata, vector, doc_norm) = row?;
            let vector: TermVector = serde_json::from_str(&vector)?;
            let score = cosine(&query_vector, query_norm, &vector, doc_norm);
            if score > 0.0 {
                scored.push(ScoredDocument {
                    document: Document {
                        content,
                        metadata: serde_json::from_str(&metadata)?,
                    },
                    score,
                });
            }
        }

        // stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

//! SQLite-backed persistence for stack sessions and their prompt templates.
//!
//! Every public operation runs in its own transaction: it commits before
//! returning, and rolls back when the transaction is dropped on an error path.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use log::debug;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use crate::domain::{PromptRecord, PromptType, StackSession};
use crate::error::Result;
use crate::id::now_ms;

/// File name used by [`PromptStore::open_at`]
pub const DB_FILE: &str = "llmstack.db";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stack_id INTEGER NOT NULL,
    meta_data TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS prompts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    type TEXT NOT NULL,
    template TEXT NOT NULL,
    meta_data TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE(session_id, type)
);

CREATE INDEX IF NOT EXISTS idx_prompts_session ON prompts(session_id);
"#;

impl ToSql for PromptType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for PromptType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Session and prompt storage
pub struct PromptStore {
    db: Mutex<Connection>,
}

impl std::fmt::Debug for PromptStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptStore").finish_non_exhaustive()
    }
}

impl PromptStore {
    /// Open or create the store inside `base_dir`.
    pub fn open_at(base_dir: &Path) -> Result<Self> {
        fs::create_dir_all(base_dir)?;
        Self::open(&base_dir.join(DB_FILE))
    }

    /// Open or create the store at an explicit database path.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!("Opening prompt store at {}", db_path.display());
        Self::with_connection(Connection::open(db_path)?)
    }

    /// Private in-memory store, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(db: Connection) -> Result<Self> {
        db.execute_batch("PRAGMA foreign_keys = ON;")?;
        db.execute_batch(SCHEMA)?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // a panicked holder can only leave an uncommitted transaction behind,
        // which rusqlite rolled back on drop
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` inside one transaction and commit it.
    fn transact<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut db = self.lock();
        let tx = db.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Create a new session.
    pub fn create_session(&self, stack_id: i64, meta_data: serde_json::Value) -> Result<StackSession> {
        let meta_json = serde_json::to_string(&meta_data)?;
        self.transact(|tx| {
            let created_at = now_ms();
            tx.execute(
                "INSERT INTO sessions (stack_id, meta_data, created_at) VALUES (?1, ?2, ?3)",
                params![stack_id, meta_json, created_at],
            )?;
            Ok(StackSession {
                id: tx.last_insert_rowid(),
                stack_id,
                meta_data,
                created_at,
            })
        })
    }

    /// Get a session by ID.
    pub fn get_session(&self, id: i64) -> Result<Option<StackSession>> {
        self.transact(|tx| get_session_in(tx, id))
    }

    /// List all sessions, oldest first.
    pub fn list_sessions(&self) -> Result<Vec<StackSession>> {
        self.transact(|tx| {
            let mut stmt = tx.prepare("SELECT id, stack_id, meta_data, created_at FROM sessions ORDER BY id")?;
            let sessions = stmt
                .query_map([], session_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sessions)
        })
    }

    /// Look up the prompt stored for `(session_id, prompt_type)`.
    pub fn find_prompt(&self, session_id: i64, prompt_type: PromptType) -> Result<Option<PromptRecord>> {
        self.transact(|tx| find_prompt_in(tx, session_id, prompt_type))
    }

    /// Overwrite the template for `(session_id, prompt_type)`, inserting the
    /// record with empty metadata when none exists yet.
    pub fn upsert_prompt(&self, session_id: i64, prompt_type: PromptType, template: &str) -> Result<PromptRecord> {
        self.transact(|tx| upsert_prompt_in(tx, session_id, prompt_type, template))
    }

    /// Read a session and its prompt for `prompt_type` in one transaction.
    ///
    /// `None` when the session does not exist.
    pub fn find_session_prompt(
        &self,
        session_id: i64,
        prompt_type: PromptType,
    ) -> Result<Option<(StackSession, Option<PromptRecord>)>> {
        self.transact(|tx| match get_session_in(tx, session_id)? {
            Some(session) => Ok(Some((session, find_prompt_in(tx, session_id, prompt_type)?))),
            None => Ok(None),
        })
    }

    /// Check the session exists, run `validate`, then upsert, all in one transaction.
    ///
    /// `None` when the session does not exist; `validate` is not run then.
    pub fn upsert_session_prompt(
        &self,
        session_id: i64,
        prompt_type: PromptType,
        template: &str,
        validate: impl FnOnce() -> Result<()>,
    ) -> Result<Option<PromptRecord>> {
        self.transact(|tx| {
            if get_session_in(tx, session_id)?.is_none() {
                return Ok(None);
            }
            validate()?;
            upsert_prompt_in(tx, session_id, prompt_type, template).map(Some)
        })
    }

    /// Number of prompt records owned by a session.
    pub fn count_prompts(&self, session_id: i64) -> Result<usize> {
        self.transact(|tx| {
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM prompts WHERE session_id = ?1",
                [session_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }
}

fn get_session_in(tx: &Transaction<'_>, id: i64) -> Result<Option<StackSession>> {
    Ok(tx
        .query_row(
            "SELECT id, stack_id, meta_data, created_at FROM sessions WHERE id = ?1",
            [id],
            session_from_row,
        )
        .optional()?)
}

fn upsert_prompt_in(
    tx: &Transaction<'_>,
    session_id: i64,
    prompt_type: PromptType,
    template: &str,
) -> Result<PromptRecord> {
    let now = now_ms();
    match find_prompt_in(tx, session_id, prompt_type)? {
        Some(mut record) => {
            tx.execute(
                "UPDATE prompts SET template = ?1, updated_at = ?2 WHERE id = ?3",
                params![template, now, record.id],
            )?;
            debug!("Updated {} prompt for session {}", prompt_type, session_id);
            record.template = template.to_string();
            record.updated_at = now;
            Ok(record)
        }
        None => {
            let meta_data = serde_json::json!({});
            tx.execute(
                r#"
                INSERT INTO prompts (session_id, type, template, meta_data, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                "#,
                params![session_id, prompt_type, template, meta_data.to_string(), now],
            )?;
            debug!("Created {} prompt for session {}", prompt_type, session_id);
            Ok(PromptRecord {
                id: tx.last_insert_rowid(),
                session_id,
                prompt_type,
                template: template.to_string(),
                meta_data,
                created_at: now,
                updated_at: now,
            })
        }
    }
}

fn find_prompt_in(tx: &Transaction<'_>, session_id: i64, prompt_type: PromptType) -> Result<Option<PromptRecord>> {
    Ok(tx
        .query_row(
            r#"
            SELECT id, session_id, type, template, meta_data, created_at, updated_at
            FROM prompts WHERE session_id = ?1 AND type = ?2
            "#,
            params![session_id, prompt_type],
            prompt_from_row,
        )
        .optional()?)
}

fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<StackSession> {
    Ok(StackSession {
        id: row.get(0)?,
        stack_id: row.get(1)?,
        meta_data: json_column(row, 2)?,
        created_at: row.get(3)?,
    })
}

fn prompt_from_row(row: &Row<'_>) -> rusqlite::Result<PromptRecord> {
    Ok(PromptRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        prompt_type: row.get(2)?,
        template: row.get(3)?,
        meta_data: json_column(row, 4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

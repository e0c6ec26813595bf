//! Local entity store for candidates, requests, skill matrices and their history.
//!
//! Everything lives under one storage root:
//!
//! ```text
//! <root>/
//!   staffbook.sqlite          # All tables
//!   documents/<candidate>/    # Uploaded CVs and assessments
//!   outbox.jsonl              # Notifications, when no command is configured
//! ```
//!
//! The store is the single source of truth. Nothing is cached between calls.

mod candidate;
mod documents;
mod history;
mod matrix;
mod request;

pub use candidate::CandidateFilter;

use std::path::{Path, PathBuf};
use std::{fs, io};

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::model::ValidationError;
use crate::workflow::WorkflowError;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("{kind} {id} was changed by someone else; reload and try again")]
    StaleWrite { kind: &'static str, id: Uuid },

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS candidates (
    id           TEXT PRIMARY KEY,
    full_name    TEXT NOT NULL,
    department   TEXT NOT NULL,
    position     TEXT NOT NULL,
    source       TEXT NOT NULL,
    obtained_on  TEXT NOT NULL,
    interviewer  TEXT,
    status       TEXT NOT NULL,
    notes        TEXT NOT NULL,
    cv           TEXT,
    assessment   TEXT,
    updated_at   TEXT NOT NULL,
    version      INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS recruiting_requests (
    id             TEXT PRIMARY KEY,
    department     TEXT NOT NULL,
    position       TEXT NOT NULL,
    description    TEXT NOT NULL,
    headcount      INTEGER NOT NULL CHECK (headcount > 0),
    position_type  TEXT NOT NULL,
    category       TEXT NOT NULL,
    confidential   INTEGER NOT NULL,
    status         TEXT NOT NULL,
    requested_by   TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    version        INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS skill_matrices (
    id           TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    department   TEXT NOT NULL,
    description  TEXT NOT NULL,
    active       INTEGER NOT NULL,
    skills       TEXT NOT NULL,
    members      TEXT NOT NULL,
    levels       TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS matrix_history (
    id         TEXT PRIMARY KEY,
    matrix_id  TEXT NOT NULL REFERENCES skill_matrices (id) ON DELETE CASCADE,
    seq        INTEGER NOT NULL,
    taken_at   TEXT NOT NULL,
    name       TEXT NOT NULL,
    skills     TEXT NOT NULL,
    members    TEXT NOT NULL,
    levels     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS matrix_history_by_matrix ON matrix_history (matrix_id, seq);
";

/// Local `SQLite`-backed storage with a document directory alongside.
pub struct Storage {
    root: PathBuf,
    conn: Connection,
}

impl Storage {
    /// Opens (or creates) the store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let conn = Connection::open(root.join("staffbook.sqlite"))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(root = %root.display(), "opened store");
        Ok(Self { root, conn })
    }

    /// Returns the default storage root: `~/.staffbook/data/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".staffbook").join("data"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Explains why a version-guarded update touched no rows.
    fn missing_or_stale(&self, table: &str, kind: &'static str, id: Uuid) -> Result<StorageError> {
        let exists = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {table} WHERE id = ?1"),
                [id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(if exists {
            StorageError::StaleWrite { kind, id }
        } else {
            StorageError::NotFound { kind, id }
        })
    }
}

/// Parses a UUID column.
fn parse_id(value: &str, column: &str) -> Result<Uuid> {
    value
        .parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}

/// Parses any `FromStr` column, reporting which column was bad.
fn parse_column<T>(value: &str, column: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}

/// Converts a stored version counter.
fn parse_version(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| StorageError::Corrupt(format!("negative version: {value}")))
}

/// Converts an in-memory version counter for storage.
fn version_param(version: u64) -> Result<i64> {
    i64::try_from(version).map_err(|_| StorageError::Corrupt(format!("version overflow: {version}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::Storage;

    pub fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("data")).unwrap();
        (dir, storage)
    }
}

//! SQLite-backed store.
//!
//! Implements every collaborator trait on a single database file (default
//! `~/.tally/measures.db`).
//!
//! # Design
//!
//! - One connection guarded by a mutex; operations are serialised
//! - A thread streaming rows into a handler may not re-enter the store: the
//!   nested call fails with [`StoreError::Reentrant`] instead of blocking
//! - Versioned schema; a database written by another version is refused
//! - Facts are append-only: there is no update or delete of measures
//!
//! # Tables
//!
//! ```text
//! components        uuid, project_uuid, uuid_path, kee, name, scope, qualifier, enabled
//! snapshots         uuid, component_uuid, islast, created_at
//! metrics           id, key, name
//! project_measures  component_uuid, analysis_uuid, metric_id, person_id, value, ...
//! meta              key -> value ("version")
//! ```

mod analyses;
mod components;
mod measures;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{default_database_path, StoreError, StoreResult};
use crate::config::DatabaseSettings;

/// Current schema version. Bump this when the table layout changes.
const SCHEMA_VERSION: i32 = 1;

/// Maximum number of values bound into a single `IN (...)` list.
pub(crate) const PARTITION_SIZE: usize = 999;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS components (
        uuid TEXT PRIMARY KEY,
        project_uuid TEXT NOT NULL,
        uuid_path TEXT NOT NULL,
        kee TEXT NOT NULL,
        name TEXT NOT NULL,
        scope TEXT NOT NULL,
        qualifier TEXT NOT NULL,
        enabled INTEGER NOT NULL DEFAULT 1
    );
    CREATE INDEX IF NOT EXISTS components_project ON components (project_uuid, uuid_path);

    CREATE TABLE IF NOT EXISTS snapshots (
        uuid TEXT PRIMARY KEY,
        component_uuid TEXT NOT NULL,
        islast INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS snapshots_component ON snapshots (component_uuid, islast);

    CREATE TABLE IF NOT EXISTS metrics (
        id INTEGER PRIMARY KEY,
        key TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS project_measures (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        component_uuid TEXT NOT NULL,
        analysis_uuid TEXT NOT NULL,
        metric_id INTEGER NOT NULL,
        person_id INTEGER,
        value REAL,
        text_value TEXT,
        variation_value_1 REAL,
        variation_value_2 REAL,
        variation_value_3 REAL,
        variation_value_4 REAL,
        variation_value_5 REAL,
        alert_status TEXT,
        alert_text TEXT,
        description TEXT
    );
    -- person-less rows must collide too, so NULL is folded into -1
    CREATE UNIQUE INDEX IF NOT EXISTS measures_identity
        ON project_measures (component_uuid, analysis_uuid, metric_id, IFNULL(person_id, -1));
    CREATE INDEX IF NOT EXISTS measures_analysis ON project_measures (analysis_uuid, metric_id);
";

/// SQLite implementation of the measure, component, analysis and metric
/// stores.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    /// Thread currently holding `conn` while it feeds a row handler.
    streaming: Mutex<Option<ThreadId>>,
}

impl SqliteStore {
    /// Open or create the database described by `settings`.
    ///
    /// Falls back to `~/.tally/measures.db` when no path is configured.
    pub fn open(settings: &DatabaseSettings) -> StoreResult<Self> {
        let path = match &settings.path {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };
        Self::open_path(&path, settings)
    }

    /// Open or create the database at `path`.
    pub fn open_path(path: &Path, settings: &DatabaseSettings) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;
        let mode: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            settings.journal_mode.as_str(),
            |row| row.get(0),
        )?;
        debug!(path = %path.display(), journal_mode = %mode, "opened measure database");

        Self::init(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;

        let stored: Option<String> = conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                row.get(0)
            })
            .optional()?;
        let stored_version = stored
            .map(|raw| {
                raw.parse::<i32>().map_err(|_| StoreError::CorruptRow {
                    table: "meta",
                    reason: format!("schema version {raw:?} is not a number"),
                })
            })
            .transpose()?;

        match stored_version {
            Some(v) if v == SCHEMA_VERSION => {}
            Some(found) => {
                return Err(StoreError::SchemaVersion {
                    found,
                    expected: SCHEMA_VERSION,
                });
            }
            None => {
                conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('version', ?)",
                    params![SCHEMA_VERSION.to_string()],
                )?;
                info!(version = SCHEMA_VERSION, "initialized measure schema");
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
            streaming: Mutex::new(None),
        })
    }

    /// Lock the connection for the duration of one operation.
    ///
    /// Fails with [`StoreError::Reentrant`] when called from a row handler
    /// this store is currently feeding, since the lock is already held by
    /// the same thread.
    pub(crate) fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        let current = thread::current().id();
        let streaming = *self.streaming.lock().map_err(|_| StoreError::LockPoisoned)?;
        if streaming == Some(current) {
            return Err(StoreError::Reentrant);
        }
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Mark the current thread as feeding a row handler until the returned
    /// guard drops. Call only while holding the connection lock.
    pub(crate) fn mark_streaming(&self) -> StoreResult<StreamingMark<'_>> {
        let mut slot = self.streaming.lock().map_err(|_| StoreError::LockPoisoned)?;
        *slot = Some(thread::current().id());
        Ok(StreamingMark {
            slot: &self.streaming,
        })
    }

    /// Number of stored facts.
    pub fn count_measures(&self) -> StoreResult<usize> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM project_measures", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Clears the streaming mark of a [`SqliteStore`] on drop.
pub(crate) struct StreamingMark<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl Drop for StreamingMark<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

/// Placeholder list `?, ?, ?` for `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

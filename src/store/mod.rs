//! SQLite-backed storage for tenant instances and scheduled messages.

mod instances;
mod schedules;

pub use instances::Instance;
pub use schedules::{NewSchedule, ScheduledMessage};

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{Error, Result};

/// Handle to the database file. Every call opens its own connection.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured database path.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.database.resolve_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)
            .map_err(|e| Error::Store(format!("sqlite open: {}", e)))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS instances (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                base_url TEXT NOT NULL,
                token TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS scheduled_messages (
                id TEXT PRIMARY KEY,
                instance_id TEXT NOT NULL,
                target TEXT NOT NULL,
                message TEXT NOT NULL,
                first_run INTEGER NOT NULL,
                next_run INTEGER NOT NULL,
                recurrence TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                last_error TEXT,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_scheduled_due ON scheduled_messages(active, next_run);
            "#,
        )
        .map_err(|e| Error::Store(format!("sqlite init: {}", e)))?;
        Ok(conn)
    }
}

#[cfg(test)]
pub(crate) fn temp_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("nested").join("zapcmd.db"));
    (dir, store)
}

//! SQLite database layer for session persistence

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::queries::SessionQueries;

/// Where the database lives, as resolved from a connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Accepts `sqlite://path`, `sqlite:path`, a bare path, or `:memory:`.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let rest = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        if rest.contains("://") {
            return Err(anyhow!("Unsupported database URL '{}': only SQLite is supported", url));
        }

        // Connection options such as `?mode=rwc` are not meaningful here.
        let rest = rest.split('?').next().unwrap_or_default();

        match rest {
            "" => Err(anyhow!("Database URL is empty")),
            ":memory:" => Ok(Self::Memory),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

/// Database manager for session persistence
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database named by a connection string
    pub async fn connect(url: &str) -> Result<Self> {
        match DatabaseLocation::parse(url)? {
            DatabaseLocation::Memory => Self::open_in_memory(),
            DatabaseLocation::File(path) => Self::open(path),
        }
    }

    /// Open (or create) an on-disk database
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening session database at {}", db_path.display());
        Self::init(Connection::open(db_path)?)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory session database");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        create_tables(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `work` inside one transaction. It commits only if `work` succeeds;
    /// any error drops the transaction, rolling back everything it did.
    pub async fn unit_of_work<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&SessionQueries<'_>) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let value = work(&SessionQueries::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) async fn execute_batch(&self, sql: &str) -> rusqlite::Result<()> {
        self.conn.lock().await.execute_batch(sql)
    }
}

fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS interview_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL DEFAULT 'Untitled Session',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS session_interactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            created_at TEXT NOT NULL,
            interaction_order INTEGER NOT NULL,
            FOREIGN KEY (session_id) REFERENCES interview_sessions (id) ON DELETE CASCADE,
            UNIQUE (session_id, interaction_order)
        );

        CREATE INDEX IF NOT EXISTS idx_interactions_session_id ON session_interactions (session_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON interview_sessions (updated_at);",
    )
}

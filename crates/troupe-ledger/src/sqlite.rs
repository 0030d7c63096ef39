//! SQLite-backed `EventLedger` implementation with durable persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use troupe_core::current_timestamp_string;

use crate::{EventLedger, LedgerResult};

/// Persistent ledger at a database path. Connections are opened per call and
/// dropped when the call returns; no pooling.
#[derive(Debug, Clone)]
pub struct SqliteEventLedger {
    db_path: PathBuf,
}

impl SqliteEventLedger {
    /// Creates a ledger at `path`, creating parent directories and schema if
    /// needed.
    pub fn new(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let ledger = Self { db_path };
        let connection = ledger.open_connection()?;
        ledger.initialize_schema(&connection)?;
        Ok(ledger)
    }

    fn open_connection(&self) -> LedgerResult<Connection> {
        let connection = Connection::open(&self.db_path)?;
        connection.busy_timeout(Duration::from_secs(5))?;
        connection.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;
        Ok(connection)
    }

    fn initialize_schema(&self, connection: &Connection) -> LedgerResult<()> {
        connection.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                event_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                message TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

#[async_trait]
impl EventLedger for SqliteEventLedger {
    async fn has_seen(&self, event_id: &str, persona_name: &str) -> LedgerResult<bool> {
        let connection = self.open_connection()?;
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM events WHERE event_id = ?1 AND user_id = ?2",
            params![event_id, persona_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn mark_if_new(&self, event_id: &str, persona_name: &str) -> LedgerResult<bool> {
        let connection = self.open_connection()?;
        // Single statement so the existence check and the insert cannot
        // interleave with a concurrent delivery of the same event.
        let inserted = connection.execute(
            r#"
            INSERT INTO events (event_id, user_id, date)
            SELECT ?1, ?2, ?3
            WHERE NOT EXISTS (
                SELECT 1 FROM events WHERE event_id = ?1 AND user_id = ?2
            )
            "#,
            params![event_id, persona_name, current_timestamp_string()],
        )?;
        Ok(inserted > 0)
    }

    async fn record_message(&self, speaker: &str, text: &str) -> LedgerResult<()> {
        let connection = self.open_connection()?;
        connection.execute(
            "INSERT INTO messages (user_id, date, message) VALUES (?1, ?2, ?3)",
            params![speaker, current_timestamp_string(), text],
        )?;
        Ok(())
    }
}

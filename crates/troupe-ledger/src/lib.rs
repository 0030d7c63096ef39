//! Event ledger abstractions and the SQLite backend.

use async_trait::async_trait;
use thiserror::Error;

mod sqlite;

pub use sqlite::SqliteEventLedger;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors returned by ledger implementations. Any of these means the backing
/// store is unavailable for the current request.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Durable idempotency guard and message transcript.
///
/// `(event_id, persona_name)` is the deduplication key. Marking and the
/// transcript are independent: `record_message` is appended for every
/// accepted message whether or not a reply follows.
#[async_trait]
pub trait EventLedger: Send + Sync {
    /// True when the pair has been marked before.
    async fn has_seen(&self, event_id: &str, persona_name: &str) -> LedgerResult<bool>;

    /// Marks the pair as seen. Returns true when this call inserted it and
    /// false when it already existed; the insert-if-absent is atomic, so two
    /// concurrent deliveries of the same event cannot both observe true.
    async fn mark_if_new(&self, event_id: &str, persona_name: &str) -> LedgerResult<bool>;

    /// Appends one transcript row.
    async fn record_message(&self, speaker: &str, text: &str) -> LedgerResult<()>;
}

//! # Posting Outbox Repository
//!
//! Closed-session figures waiting for the downstream accounting poster.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  Close(session)                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. UPDATE cash_sessions SET status = 'closed', figures ...    │   │
//! │  │                                                                 │   │
//! │  │  2. INSERT INTO posting_outbox (session_id, payload)           │   │
//! │  │     VALUES (?, <ClosedSessionTotals JSON>)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← both rows or neither                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            ACCOUNTING POSTER (external)                         │   │
//! │  │                                                                 │   │
//! │  │  1. list_pending(limit)                                        │   │
//! │  │  2. post each entry to the general ledger                      │   │
//! │  │     a. On success: mark_posted(id)                             │   │
//! │  │     b. On failure: mark_failed(id, error)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one entry per session (`UNIQUE(session_id)`).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use drawer_core::PostingOutboxEntry;

const OUTBOX_COLUMNS: &str = r#"
    id, session_id, payload, attempts, last_error, created_at, attempted_at, posted_at
"#;

/// Repository for posting outbox operations.
#[derive(Debug, Clone)]
pub struct PostingOutboxRepository {
    pool: SqlitePool,
}

impl PostingOutboxRepository {
    /// Creates a new PostingOutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PostingOutboxRepository { pool }
    }

    /// Entries not yet posted, oldest first.
    pub async fn list_pending(&self, limit: u32) -> DbResult<Vec<PostingOutboxEntry>> {
        let entries = sqlx::query_as::<_, PostingOutboxEntry>(&format!(
            r#"
            SELECT {OUTBOX_COLUMNS}
            FROM posting_outbox
            WHERE posted_at IS NULL
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// The entry queued when a session closed, if any.
    pub async fn get_for_session(&self, session_id: &str) -> DbResult<Option<PostingOutboxEntry>> {
        let entry = sqlx::query_as::<_, PostingOutboxEntry>(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM posting_outbox WHERE session_id = ?1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Marks an entry as posted.
    pub async fn mark_posted(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE posting_outbox SET
                posted_at = ?2,
                attempted_at = ?2,
                attempts = attempts + 1,
                last_error = NULL
            WHERE id = ?1 AND posted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending outbox entry", id));
        }

        debug!(id = %id, "Outbox entry posted");
        Ok(())
    }

    /// Records a posting failure.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE posting_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1 AND posted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending outbox entry", id));
        }

        warn!(id = %id, error = %error, "Outbox posting failed");
        Ok(())
    }

    /// Counts entries not yet posted.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posting_outbox WHERE posted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Queues a payload inside the caller's transaction.
pub(crate) async fn enqueue<'e, E>(
    executor: E,
    session_id: &str,
    payload: &str,
    created_at: DateTime<Utc>,
) -> DbResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    debug!(session_id = %session_id, "Queuing closed totals for posting");

    sqlx::query(
        r#"
        INSERT INTO posting_outbox (id, session_id, payload, attempts, created_at)
        VALUES (?1, ?2, ?3, 0, ?4)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(session_id)
    .bind(payload)
    .bind(created_at)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

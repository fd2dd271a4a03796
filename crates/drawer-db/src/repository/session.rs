//! # Session Repository
//!
//! Storage for cash session rows, including the two transactional
//! lifecycle writes.
//!
//! ## Open Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. UPDATE cash_registers SET last_opened_at = now   ← write lock     │
//! │    2. SELECT id FROM cash_sessions                                      │
//! │         WHERE register, period, business_date AND status = 'open'       │
//! │         └── found? ROLLBACK ──► Conflict { existing_session_id }        │
//! │    3. INSERT INTO cash_sessions (... status = 'open')                   │
//! │         └── idx_cash_sessions_one_open violated? ──► Conflict           │
//! │  COMMIT ──► Opened                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Close Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. UPDATE cash_sessions SET updated_at WHERE id AND status = 'open'  │
//! │         └── 0 rows? ROLLBACK ──► NotOpen                                │
//! │    2. SELECT session, SELECT movements   (nothing can append now)       │
//! │    3. fold ──► ClosingFigures                                           │
//! │    4. UPDATE cash_sessions SET status = 'closed', figures ...           │
//! │         WHERE id AND status = 'open'                                    │
//! │    5. INSERT INTO posting_outbox (ClosedSessionTotals JSON)             │
//! │  COMMIT ──► Closed { session, figures }                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 1 of each transaction is a write so the connection holds SQLite's
//! write lock before it reads anything. A competing writer waits on the
//! busy timeout and then reads the committed outcome.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{movement, outbox};
use drawer_core::{CashSession, ClosingFigures, Money, SessionState, SettlementCheck};

const SESSION_COLUMNS: &str = r#"
    id, register_id, operator_id, period_label, business_date, status,
    opening_float_cents, opened_at, closed_at,
    counted_closing_cents, theoretical_closing_cents, variance_cents,
    notes, force_closed, unsettled_at_close, updated_at
"#;

/// Result of a uniqueness-checked insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The session row was written.
    Opened,
    /// Another open session already holds the key.
    ///
    /// `existing_session_id` is `None` only when the partial index caught a
    /// writer that bypassed the locked check.
    Conflict { existing_session_id: Option<String> },
}

/// Result of a guarded close.
#[derive(Debug, Clone)]
pub enum CloseOutcome {
    Closed {
        session: CashSession,
        figures: ClosingFigures,
    },
    /// Missing, or closed by someone else first.
    NotOpen,
}

/// Arguments of a close that the repository writes verbatim.
#[derive(Debug, Clone)]
pub struct CloseRequest<'a> {
    pub session_id: &'a str,
    pub counted: Money,
    pub notes: Option<&'a str>,
    pub check: &'a SettlementCheck,
    pub closed_at: DateTime<Utc>,
}

/// Repository for cash session operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Inserts an open session unless one already exists for the same
    /// register, period label and business date.
    pub async fn open_unique(&self, session: &CashSession) -> DbResult<OpenOutcome> {
        debug!(
            id = %session.id,
            register_id = %session.register_id,
            period = %session.period_label,
            business_date = %session.business_date,
            "Opening session"
        );

        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query(
            "UPDATE cash_registers SET last_opened_at = ?2, updated_at = ?2 WHERE id = ?1",
        )
        .bind(&session.register_id)
        .bind(session.opened_at)
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::not_found("Register", &session.register_id));
        }

        let existing: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM cash_sessions
            WHERE register_id = ?1
              AND period_label = ?2
              AND business_date = ?3
              AND status = 'open'
            LIMIT 1
            "#,
        )
        .bind(&session.register_id)
        .bind(&session.period_label)
        .bind(session.business_date)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing_session_id) = existing {
            tx.rollback().await?;
            return Ok(OpenOutcome::Conflict {
                existing_session_id: Some(existing_session_id),
            });
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, register_id, operator_id, period_label, business_date, status,
                opening_float_cents, opened_at, force_closed, unsettled_at_close, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'open', ?6, ?7, 0, 0, ?8)
            "#,
        )
        .bind(&session.id)
        .bind(&session.register_id)
        .bind(&session.operator_id)
        .bind(&session.period_label)
        .bind(session.business_date)
        .bind(session.opening_float_cents)
        .bind(session.opened_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from);

        match inserted {
            Ok(_) => {}
            Err(err) if err.is_unique_violation_on("cash_sessions.register_id") => {
                tx.rollback().await?;
                return Ok(OpenOutcome::Conflict {
                    existing_session_id: None,
                });
            }
            Err(err) => return Err(err),
        }

        tx.commit().await?;
        Ok(OpenOutcome::Opened)
    }

    /// Gets a session by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<CashSession>> {
        fetch_session(&self.pool, id).await
    }

    /// Open sessions, optionally for one register, oldest first.
    pub async fn list_open(&self, register_id: Option<&str>) -> DbResult<Vec<CashSession>> {
        let sessions = sqlx::query_as::<_, CashSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM cash_sessions
            WHERE status = 'open'
              AND (?1 IS NULL OR register_id = ?1)
            ORDER BY opened_at ASC, rowid ASC
            "#
        ))
        .bind(register_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// All sessions of one business date, open or closed.
    pub async fn list_for_date(&self, business_date: NaiveDate) -> DbResult<Vec<CashSession>> {
        let sessions = sqlx::query_as::<_, CashSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM cash_sessions
            WHERE business_date = ?1
            ORDER BY register_id ASC, opened_at ASC, rowid ASC
            "#
        ))
        .bind(business_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Closes an open session, freezing the figures folded from its ledger
    /// and queueing them for posting, in one transaction.
    pub async fn close(&self, request: CloseRequest<'_>) -> DbResult<CloseOutcome> {
        let CloseRequest {
            session_id,
            counted,
            notes,
            check,
            closed_at,
        } = request;

        debug!(session_id = %session_id, counted = %counted, "Closing session");

        let mut tx = self.pool.begin().await?;

        let guard = sqlx::query(
            "UPDATE cash_sessions SET updated_at = ?2 WHERE id = ?1 AND status = 'open'",
        )
        .bind(session_id)
        .bind(closed_at)
        .execute(&mut *tx)
        .await?;

        if guard.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(CloseOutcome::NotOpen);
        }

        let session = fetch_session(&mut *tx, session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", session_id))?;
        let movements = movement::fetch_for_session(&mut *tx, session_id).await?;

        let figures = ClosingFigures::from_ledger(&session, &movements, counted, check);

        let updated = sqlx::query(
            r#"
            UPDATE cash_sessions SET
                status = 'closed',
                closed_at = ?2,
                counted_closing_cents = ?3,
                theoretical_closing_cents = ?4,
                variance_cents = ?5,
                notes = ?6,
                force_closed = ?7,
                unsettled_at_close = ?8,
                updated_at = ?2
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(session_id)
        .bind(closed_at)
        .bind(figures.counted.cents())
        .bind(figures.theoretical.cents())
        .bind(figures.variance.cents())
        .bind(notes)
        .bind(figures.force_closed)
        .bind(figures.unsettled_at_close)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(CloseOutcome::NotOpen);
        }

        let payload = serde_json::to_string(&figures.frozen_totals(&session))?;
        outbox::enqueue(&mut *tx, session_id, &payload, closed_at).await?;

        tx.commit().await?;

        info!(
            session_id = %session_id,
            theoretical = %figures.theoretical,
            counted = %figures.counted,
            variance = %figures.variance,
            "Session row closed"
        );

        let session = CashSession {
            status: SessionState::Closed,
            closed_at: Some(closed_at),
            counted_closing_cents: Some(figures.counted.cents()),
            theoretical_closing_cents: Some(figures.theoretical.cents()),
            variance_cents: Some(figures.variance.cents()),
            notes: notes.map(str::to_string),
            force_closed: figures.force_closed,
            unsettled_at_close: figures.unsettled_at_close,
            updated_at: closed_at,
            ..session
        };

        Ok(CloseOutcome::Closed { session, figures })
    }
}

async fn fetch_session<'e, E>(executor: E, id: &str) -> DbResult<Option<CashSession>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let session = sqlx::query_as::<_, CashSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(session)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::*;
    use drawer_core::{MovementKind, NewMovement};

    async fn close(db: &crate::Database, id: &str, counted: i64) -> CloseOutcome {
        db.sessions()
            .close(CloseRequest {
                session_id: id,
                counted: Money::from_cents(counted),
                notes: None,
                check: &SettlementCheck::Clear,
                closed_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_then_conflict() {
        let db = database().await;
        let reg = register(&db, "R1").await;
        let day = date(2024, 3, 1);

        let first = draft_session(&reg.id, "Morning", day);
        assert_eq!(db.sessions().open_unique(&first).await.unwrap(), OpenOutcome::Opened);

        let second = draft_session(&reg.id, "Morning", day);
        assert_eq!(
            db.sessions().open_unique(&second).await.unwrap(),
            OpenOutcome::Conflict {
                existing_session_id: Some(first.id.clone())
            }
        );

        let touched = db.registers().get_by_id(&reg.id).await.unwrap().unwrap();
        assert!(touched.last_opened_at.is_some());
    }

    #[tokio::test]
    async fn test_partial_index_rejects_second_open_row() {
        let db = database().await;
        let reg = register(&db, "R1").await;
        let day = date(2024, 3, 1);
        let first = draft_session(&reg.id, "Morning", day);
        db.sessions().open_unique(&first).await.unwrap();

        let raw = sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, register_id, operator_id, period_label, business_date,
                opening_float_cents, opened_at, updated_at
            ) VALUES ('x', ?1, 'op', 'Morning', ?2, 0, ?3, ?3)
            "#,
        )
        .bind(&reg.id)
        .bind(day)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .map_err(DbError::from)
        .unwrap_err();

        assert!(raw.is_unique_violation_on("cash_sessions.register_id"));
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_conflict() {
        let db = database().await;
        let reg = register(&db, "R1").await;
        let other = register(&db, "R2").await;
        let day = date(2024, 3, 1);

        for session in [
            draft_session(&reg.id, "Morning", day),
            draft_session(&reg.id, "Evening", day),
            draft_session(&reg.id, "Morning", date(2024, 3, 2)),
            draft_session(&other.id, "Morning", day),
        ] {
            assert_eq!(db.sessions().open_unique(&session).await.unwrap(), OpenOutcome::Opened);
        }

        assert_eq!(db.sessions().list_open(None).await.unwrap().len(), 4);
        assert_eq!(db.sessions().list_open(Some(&reg.id)).await.unwrap().len(), 3);
        assert_eq!(db.sessions().list_for_date(day).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_open_for_unknown_register() {
        let db = database().await;
        let session = draft_session("ghost", "Morning", date(2024, 3, 1));
        let err = db.sessions().open_unique(&session).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_close_freezes_figures_and_queues_outbox() {
        let db = database().await;
        let reg = register(&db, "R1").await;
        let session = draft_session(&reg.id, "Morning", date(2024, 3, 1));
        db.sessions().open_unique(&session).await.unwrap();

        let movements = db.movements();
        for (kind, cents) in [(MovementKind::Sale, 12_000), (MovementKind::CashOut, 2_000)] {
            let movement = NewMovement::new(kind, Money::from_cents(cents), "");
            movements
                .append(&session.id, &movement, Utc::now())
                .await
                .unwrap()
                .unwrap();
        }

        let (closed, figures) = match close(&db, &session.id, 59_000).await {
            CloseOutcome::Closed { session, figures } => (session, figures),
            CloseOutcome::NotOpen => panic!("expected close to succeed"),
        };

        assert_eq!(figures.theoretical.cents(), 60_000);
        assert_eq!(figures.variance.cents(), -1_000);
        assert_eq!(closed.status, SessionState::Closed);

        let stored = db.sessions().get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionState::Closed);
        assert_eq!(stored.theoretical_closing_cents, Some(60_000));
        assert_eq!(stored.counted_closing_cents, Some(59_000));
        assert_eq!(stored.variance_cents, Some(-1_000));
        assert!(stored.closed_at.is_some());

        let entry = db.posting_outbox().get_for_session(&session.id).await.unwrap().unwrap();
        let totals = entry.totals().unwrap();
        assert_eq!(totals.theoretical_closing_cents, 60_000);
        assert_eq!(totals.totals.sales_cents, 12_000);
    }

    #[tokio::test]
    async fn test_second_close_is_not_open() {
        let db = database().await;
        let reg = register(&db, "R1").await;
        let session = draft_session(&reg.id, "Morning", date(2024, 3, 1));
        db.sessions().open_unique(&session).await.unwrap();

        assert!(matches!(close(&db, &session.id, 50_000).await, CloseOutcome::Closed { .. }));
        assert!(matches!(close(&db, &session.id, 1).await, CloseOutcome::NotOpen));
        assert!(matches!(close(&db, "missing", 1).await, CloseOutcome::NotOpen));

        let stored = db.sessions().get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.counted_closing_cents, Some(50_000));
    }

    #[tokio::test]
    async fn test_reopen_after_close() {
        let db = database().await;
        let reg = register(&db, "R1").await;
        let day = date(2024, 3, 1);
        let first = draft_session(&reg.id, "Morning", day);
        db.sessions().open_unique(&first).await.unwrap();
        close(&db, &first.id, 50_000).await;

        let again = draft_session(&reg.id, "Morning", day);
        assert_eq!(db.sessions().open_unique(&again).await.unwrap(), OpenOutcome::Opened);
    }
}

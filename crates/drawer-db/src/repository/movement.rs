//! # Movement Repository
//!
//! The append-only cash movement ledger. Rows are never updated or deleted
//! (triggers in the schema abort both), and an append only lands while the
//! owning session is open.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use drawer_core::{CashMovement, NewMovement};

const MOVEMENT_COLUMNS: &str = r#"
    id, session_id, kind, amount_cents, description, reference, recorded_at
"#;

/// Repository for the movement ledger.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends a movement to an open session.
    ///
    /// The open check and the insert are one statement, so a movement can
    /// never land after a concurrent close has committed.
    ///
    /// ## Returns
    /// * `Some(movement)` - Appended
    /// * `None` - Session missing or not open
    pub async fn append(
        &self,
        session_id: &str,
        movement: &NewMovement,
        recorded_at: DateTime<Utc>,
    ) -> DbResult<Option<CashMovement>> {
        let id = Uuid::new_v4().to_string();

        debug!(
            session_id = %session_id,
            kind = %movement.kind,
            amount = %movement.amount,
            "Appending movement"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO cash_movements (
                id, session_id, kind, amount_cents, description, reference, recorded_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
            WHERE EXISTS (
                SELECT 1 FROM cash_sessions WHERE id = ?2 AND status = 'open'
            )
            "#,
        )
        .bind(&id)
        .bind(session_id)
        .bind(movement.kind)
        .bind(movement.amount.cents())
        .bind(&movement.description)
        .bind(&movement.reference)
        .bind(recorded_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(CashMovement {
            id,
            session_id: session_id.to_string(),
            kind: movement.kind,
            amount_cents: movement.amount.cents(),
            description: movement.description.clone(),
            reference: movement.reference.clone(),
            recorded_at,
        }))
    }

    /// A session's movements in the order they were recorded.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        fetch_for_session(&self.pool, session_id).await
    }

    /// Number of movements recorded against a session.
    pub async fn count_for_session(&self, session_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cash_movements WHERE session_id = ?1")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

pub(crate) async fn fetch_for_session<'e, E>(
    executor: E,
    session_id: &str,
) -> DbResult<Vec<CashMovement>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let movements = sqlx::query_as::<_, CashMovement>(&format!(
        r#"
        SELECT {MOVEMENT_COLUMNS}
        FROM cash_movements
        WHERE session_id = ?1
        ORDER BY rowid ASC
        "#
    ))
    .bind(session_id)
    .fetch_all(executor)
    .await?;

    Ok(movements)
}

// =============================================================================
// Unit Tests
// =============================================================================

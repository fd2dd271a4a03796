//! # Pending Sale Repository
//!
//! Sales rung up against a session whose payment is not final yet. The
//! sales module writes these; Close() reads the non-terminal ones.
//!
//! ```text
//!   pending ──► partially_paid ──► settled
//!      │              │
//!      └──────────────┴──────────► cancelled
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use drawer_core::{Money, PendingSale, SettlementStatus};

const PENDING_SALE_COLUMNS: &str = "id, session_id, reference, amount_cents, status";

/// Repository for pending sale operations.
#[derive(Debug, Clone)]
pub struct PendingSaleRepository {
    pool: SqlitePool,
}

impl PendingSaleRepository {
    /// Creates a new PendingSaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PendingSaleRepository { pool }
    }

    /// Records a sale against a session.
    pub async fn record(
        &self,
        session_id: &str,
        reference: &str,
        amount: Money,
        status: SettlementStatus,
    ) -> DbResult<PendingSale> {
        let now = Utc::now();
        let sale = PendingSale {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            reference: reference.to_string(),
            amount_cents: amount.cents(),
            status,
        };

        debug!(id = %sale.id, session_id = %session_id, status = ?status, "Recording sale");

        sqlx::query(
            r#"
            INSERT INTO pending_sales (
                id, session_id, reference, amount_cents, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.session_id)
        .bind(&sale.reference)
        .bind(sale.amount_cents)
        .bind(sale.status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<PendingSale>> {
        let sale = sqlx::query_as::<_, PendingSale>(&format!(
            "SELECT {PENDING_SALE_COLUMNS} FROM pending_sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Every sale recorded against a session.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<PendingSale>> {
        let sales = sqlx::query_as::<_, PendingSale>(&format!(
            r#"
            SELECT {PENDING_SALE_COLUMNS}
            FROM pending_sales
            WHERE session_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Sales still `pending` or `partially_paid`.
    pub async fn list_unsettled(&self, session_id: &str) -> DbResult<Vec<PendingSale>> {
        let sales = sqlx::query_as::<_, PendingSale>(&format!(
            r#"
            SELECT {PENDING_SALE_COLUMNS}
            FROM pending_sales
            WHERE session_id = ?1
              AND status IN ('pending', 'partially_paid')
            ORDER BY created_at ASC, rowid ASC
            "#
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Moves a sale to a new settlement status.
    ///
    /// Terminal sales (settled, cancelled) do not move again.
    pub async fn set_status(&self, id: &str, status: SettlementStatus) -> DbResult<PendingSale> {
        let result = sqlx::query(
            r#"
            UPDATE pending_sales SET status = ?2, updated_at = ?3
            WHERE id = ?1 AND status IN ('pending', 'partially_paid')
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let sale = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        if result.rows_affected() == 0 && sale.status != status {
            return Err(DbError::StateConflict(format!(
                "sale {id} is already {:?} and cannot become {:?}",
                sale.status, status
            )));
        }

        debug!(id = %id, status = ?status, "Sale status updated");
        Ok(sale)
    }

    pub async fn mark_settled(&self, id: &str) -> DbResult<PendingSale> {
        self.set_status(id, SettlementStatus::Settled).await
    }

    pub async fn mark_cancelled(&self, id: &str) -> DbResult<PendingSale> {
        self.set_status(id, SettlementStatus::Cancelled).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Register Repository
//!
//! The register directory. Back-office code manages it; the session engine
//! only asks whether a register exists and is active.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use drawer_core::{CashRegister, RegisterStatus};

const REGISTER_COLUMNS: &str = r#"
    id, code, name, location, is_active, created_at, updated_at, last_opened_at
"#;

/// Repository for cash register operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Inserts a register row.
    ///
    /// A taken code fails with `UniqueViolation { field: "code" }`.
    pub async fn insert(&self, register: &CashRegister) -> DbResult<()> {
        debug!(id = %register.id, code = %register.code, "Inserting register");

        sqlx::query(
            r#"
            INSERT INTO cash_registers (
                id, code, name, location, is_active,
                created_at, updated_at, last_opened_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&register.id)
        .bind(&register.code)
        .bind(&register.name)
        .bind(&register.location)
        .bind(register.is_active)
        .bind(register.created_at)
        .bind(register.updated_at)
        .bind(register.last_opened_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &register.code),
            other => other,
        })?;

        Ok(())
    }

    /// Creates an active register with a fresh id.
    pub async fn create(
        &self,
        code: &str,
        name: &str,
        location: Option<&str>,
    ) -> DbResult<CashRegister> {
        let now = Utc::now();
        let register = CashRegister {
            id: Uuid::new_v4().to_string(),
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            location: location.map(|l| l.trim().to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
            last_opened_at: None,
        };

        self.insert(&register).await?;
        info!(id = %register.id, code = %register.code, "Register created");

        Ok(register)
    }

    /// Gets a register by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashRegister>> {
        let register = sqlx::query_as::<_, CashRegister>(&format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(register)
    }

    /// Gets a register by its human code ("CAJA-01").
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<CashRegister>> {
        let register = sqlx::query_as::<_, CashRegister>(&format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(register)
    }

    /// Lists registers ordered by code. Inactive ones only when asked.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<CashRegister>> {
        let registers = sqlx::query_as::<_, CashRegister>(&format!(
            r#"
            SELECT {REGISTER_COLUMNS}
            FROM cash_registers
            WHERE ?1 OR is_active = 1
            ORDER BY code ASC
            "#
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(registers)
    }

    /// Enables or disables a register.
    ///
    /// Open sessions on a disabled register stay open; only new opens are
    /// refused.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<CashRegister> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE cash_registers SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Register", id));
        }

        info!(id = %id, active, "Register toggled");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Register", id))
    }

    /// The `{id, active}` view read by the session engine.
    pub async fn register_status(&self, id: &str) -> DbResult<Option<RegisterStatus>> {
        Ok(self.get_by_id(id).await?.as_ref().map(RegisterStatus::from))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # CLI Commands
//!
//! Each submodule owns one subcommand group and returns JSON for stdout.
//!
//! ## Command Groups
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register  ──► drawer-db RegisterRepository (the register directory)    │
//! │  session   ──► drawer-engine SessionEngine                              │
//! │  sale      ──► drawer-db PendingSaleRepository + engine gate view       │
//! │  outbox    ──► drawer-db PostingOutboxRepository                        │
//! │  status    ──► Database::health_check, migration status                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod outbox;
pub mod register;
pub mod sale;
pub mod session;

use serde::Serialize;
use serde_json::{json, Value};

use drawer_engine::SessionEngine;

use crate::cli::Command;
use crate::error::{ApiError, ErrorCode};

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(value)?)
}

/// Runs one command against the engine and its database.
pub async fn execute(engine: &SessionEngine, command: Command) -> Result<Value, ApiError> {
    match command {
        Command::Register(cmd) => register::run(engine.database(), cmd).await,
        Command::Session(cmd) => session::run(engine, cmd).await,
        Command::Sale(cmd) => sale::run(engine, cmd).await,
        Command::Outbox(cmd) => outbox::run(engine.database(), cmd).await,
        Command::Status => status(engine).await,
    }
}

async fn status(engine: &SessionEngine) -> Result<Value, ApiError> {
    let db = engine.database();
    if !db.health_check().await {
        return Err(ApiError::new(ErrorCode::DatabaseError, "Database is not reachable"));
    }

    let migrations = db.migration_status().await?;
    let pending_postings = db.posting_outbox().count_pending().await?;

    Ok(json!({
        "healthy": true,
        "migrations": migrations,
        "schemaCurrent": migrations.is_current(),
        "utcOffsetMinutes": engine.config().offset_minutes(),
        "pendingPostings": pending_postings,
    }))
}

//! # Outbox Commands
//!
//! The accounting poster drains closed-session totals through these. The
//! engine only ever enqueues; acknowledging is the poster's job.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;

use drawer_core::{ClosedSessionTotals, PostingOutboxEntry};
use drawer_db::{Database, DbError};

use super::to_json;
use crate::error::ApiError;

#[derive(Subcommand, Debug)]
pub enum OutboxCommand {
    /// Entries not yet posted, oldest first
    Pending {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// The entry queued for one session
    Show { session_id: String },

    /// Mark an entry posted
    Ack { entry_id: String },

    /// Record a failed posting attempt
    Fail {
        entry_id: String,
        #[arg(long)]
        error: String,
    },
}

/// An outbox entry with its payload decoded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Posting {
    id: String,
    attempts: i64,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    posted: bool,
    totals: ClosedSessionTotals,
}

impl TryFrom<PostingOutboxEntry> for Posting {
    type Error = DbError;

    fn try_from(entry: PostingOutboxEntry) -> Result<Self, Self::Error> {
        Ok(Posting {
            totals: entry.totals()?,
            posted: entry.is_posted(),
            id: entry.id,
            attempts: entry.attempts,
            last_error: entry.last_error,
            created_at: entry.created_at,
        })
    }
}

pub async fn run(db: &Database, command: OutboxCommand) -> Result<Value, ApiError> {
    let outbox = db.posting_outbox();

    match command {
        OutboxCommand::Pending { limit } => {
            let postings = outbox
                .list_pending(limit)
                .await?
                .into_iter()
                .map(Posting::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            to_json(&postings)
        }
        OutboxCommand::Show { session_id } => {
            let entry = outbox
                .get_for_session(&session_id)
                .await?
                .ok_or_else(|| DbError::not_found("Outbox entry for session", &session_id))?;
            to_json(&Posting::try_from(entry)?)
        }
        OutboxCommand::Ack { entry_id } => {
            outbox.mark_posted(&entry_id).await?;
            to_json(&serde_json::json!({ "id": entry_id, "posted": true }))
        }
        OutboxCommand::Fail { entry_id, error } => {
            outbox.mark_failed(&entry_id, &error).await?;
            to_json(&serde_json::json!({ "id": entry_id, "posted": false }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use drawer_core::Money;
    use drawer_db::DbConfig;
    use drawer_engine::{CloseSession, EngineConfig, OpenSession, SessionEngine};

    async fn closed_session() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let register = db.registers().create("R1", "Front", None).await.unwrap();
        let engine = SessionEngine::new(db.clone(), EngineConfig::default());
        let session = engine
            .open(OpenSession {
                register_id: register.id,
                operator_id: "O1".into(),
                period_label: "Morning".into(),
                opening_float: Money::from_cents(1_000),
            })
            .await
            .unwrap();
        engine
            .close(CloseSession {
                session_id: session.id.clone(),
                counted: Money::from_cents(950),
                notes: None,
                force: false,
            })
            .await
            .unwrap();
        (db, session.id)
    }

    #[tokio::test]
    async fn test_drain_cycle() {
        let (db, session_id) = closed_session().await;

        let pending = run(&db, OutboxCommand::Pending { limit: 10 }).await.unwrap();
        let entries = pending.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["totals"]["variance_cents"], -50);
        assert_eq!(entries[0]["posted"], false);
        let entry_id = entries[0]["id"].as_str().unwrap().to_string();

        run(
            &db,
            OutboxCommand::Fail {
                entry_id: entry_id.clone(),
                error: "ledger offline".into(),
            },
        )
        .await
        .unwrap();
        let shown = run(&db, OutboxCommand::Show { session_id: session_id.clone() })
            .await
            .unwrap();
        assert_eq!(shown["attempts"], 1);
        assert_eq!(shown["lastError"], "ledger offline");

        run(&db, OutboxCommand::Ack { entry_id: entry_id.clone() }).await.unwrap();
        let shown = run(&db, OutboxCommand::Show { session_id }).await.unwrap();
        assert_eq!(shown["posted"], true);

        let err = run(&db, OutboxCommand::Ack { entry_id }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}

//! # Session Commands
//!
//! One subcommand per engine operation, plus the read-model queries.

use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;

use drawer_core::{CoreError, Money, MovementKind, NewMovement};
use drawer_engine::{CloseSession, OpenSession, SessionEngine};

use super::to_json;
use crate::error::ApiError;

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Open a session on a register
    Open {
        #[arg(long = "register")]
        register_id: String,
        #[arg(long = "operator")]
        operator_id: String,
        #[arg(long)]
        period: String,
        /// Opening float in minor units
        #[arg(long, allow_negative_numbers = true)]
        float: i64,
    },

    /// Record a cash movement against an open session
    Record {
        session_id: String,
        /// cash_in, cash_out, sale, refund or expense
        #[arg(long)]
        kind: String,
        /// Positive magnitude in minor units
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        reference: Option<String>,
    },

    /// Theoretical balance (frozen figure once closed)
    Balance { session_id: String },

    /// Count the drawer and close the session
    Close {
        session_id: String,
        /// Physically counted cash in minor units
        #[arg(long, allow_negative_numbers = true)]
        counted: i64,
        #[arg(long)]
        notes: Option<String>,
        /// Close even though sales are still unsettled
        #[arg(long)]
        force: bool,
    },

    /// Open sessions, optionally for one register
    ListOpen {
        #[arg(long = "register")]
        register_id: Option<String>,
    },

    /// Session, movements and per-kind totals
    Report { session_id: String },

    /// Movements of a session in recording order
    Movements { session_id: String },

    /// Sessions of one business date (YYYY-MM-DD)
    ByDate { date: NaiveDate },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    session_id: String,
    theoretical_cents: i64,
    theoretical: String,
}

pub async fn run(engine: &SessionEngine, command: SessionCommand) -> Result<Value, ApiError> {
    match command {
        SessionCommand::Open {
            register_id,
            operator_id,
            period,
            float,
        } => {
            let session = engine
                .open(OpenSession {
                    register_id,
                    operator_id,
                    period_label: period,
                    opening_float: Money::from_cents(float),
                })
                .await?;
            to_json(&session)
        }
        SessionCommand::Record {
            session_id,
            kind,
            amount,
            description,
            reference,
        } => {
            let kind: MovementKind = kind.parse().map_err(CoreError::from)?;
            let mut movement = NewMovement::new(kind, Money::from_cents(amount), description);
            if let Some(reference) = reference {
                movement = movement.with_reference(reference);
            }
            to_json(&engine.record_movement(&session_id, movement).await?)
        }
        SessionCommand::Balance { session_id } => {
            let balance = engine.compute_theoretical_balance(&session_id).await?;
            to_json(&BalanceResponse {
                session_id,
                theoretical_cents: balance.cents(),
                theoretical: balance.to_string(),
            })
        }
        SessionCommand::Close {
            session_id,
            counted,
            notes,
            force,
        } => {
            let report = engine
                .close(CloseSession {
                    session_id,
                    counted: Money::from_cents(counted),
                    notes,
                    force,
                })
                .await?;
            to_json(&report)
        }
        SessionCommand::ListOpen { register_id } => {
            to_json(&engine.list_open_sessions(register_id.as_deref()).await?)
        }
        SessionCommand::Report { session_id } => to_json(&engine.session_report(&session_id).await?),
        SessionCommand::Movements { session_id } => {
            to_json(&engine.list_movements(&session_id).await?)
        }
        SessionCommand::ByDate { date } => to_json(&engine.sessions_for_date(date).await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use drawer_db::{Database, DbConfig};
    use drawer_engine::EngineConfig;

    async fn setup() -> (SessionEngine, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let register = db.registers().create("R1", "Front", None).await.unwrap();
        (SessionEngine::new(db, EngineConfig::default()), register.id)
    }

    fn open(register_id: &str, float: i64) -> SessionCommand {
        SessionCommand::Open {
            register_id: register_id.into(),
            operator_id: "O1".into(),
            period: "Morning".into(),
            float,
        }
    }

    fn record(session_id: &str, kind: &str, amount: i64) -> SessionCommand {
        SessionCommand::Record {
            session_id: session_id.into(),
            kind: kind.into(),
            amount,
            description: String::new(),
            reference: None,
        }
    }

    #[tokio::test]
    async fn test_full_shift() {
        let (engine, register_id) = setup().await;
        let session = run(&engine, open(&register_id, 50_000)).await.unwrap();
        let session_id = session["id"].as_str().unwrap().to_string();

        run(&engine, record(&session_id, "sale", 12_000)).await.unwrap();
        run(&engine, record(&session_id, "cash-out", 2_000)).await.unwrap();
        run(&engine, record(&session_id, "expense", 500)).await.unwrap();

        let balance = run(&engine, SessionCommand::Balance { session_id: session_id.clone() })
            .await
            .unwrap();
        assert_eq!(balance["theoreticalCents"], 59_500);
        assert_eq!(balance["theoretical"], "595.00");

        let closed = run(
            &engine,
            SessionCommand::Close {
                session_id: session_id.clone(),
                counted: 59_500,
                notes: Some("all good".into()),
                force: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(closed["figures"]["variance"], 0);
        assert_eq!(closed["session"]["status"], "closed");

        let report = run(&engine, SessionCommand::Report { session_id }).await.unwrap();
        assert_eq!(report["totals"]["movement_count"], 3);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_validation_error() {
        let (engine, register_id) = setup().await;
        let session = run(&engine, open(&register_id, 0)).await.unwrap();
        let session_id = session["id"].as_str().unwrap();

        let err = run(&engine, record(session_id, "tip", 100)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_duplicate_open_reports_existing_session() {
        let (engine, register_id) = setup().await;
        let first = run(&engine, open(&register_id, 0)).await.unwrap();

        let err = run(&engine, open(&register_id, 0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateOpenSession);
        let details = err.details.unwrap();
        assert_eq!(details["existingSessionId"], first["id"]);
    }

    #[tokio::test]
    async fn test_negative_float_is_invalid_amount() {
        let (engine, register_id) = setup().await;
        let err = run(&engine, open(&register_id, -1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
    }

    #[tokio::test]
    async fn test_queries_for_unknown_session() {
        let (engine, _) = setup().await;
        let err = run(&engine, SessionCommand::Movements { session_id: "nope".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);

        let open = run(&engine, SessionCommand::ListOpen { register_id: None }).await.unwrap();
        assert!(open.as_array().unwrap().is_empty());
    }
}

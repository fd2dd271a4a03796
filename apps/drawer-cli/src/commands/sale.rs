//! # Sale Commands
//!
//! Mirrors sales from the sales module into the table the pending-settlement
//! gate reads. Only non-terminal sales (`pending`, `partially_paid`) block a
//! close.

use clap::Subcommand;
use serde_json::Value;

use drawer_core::{validation, CoreError, Money, SettlementStatus, ValidationError};
use drawer_engine::SessionEngine;

use super::to_json;
use crate::error::ApiError;

#[derive(Subcommand, Debug)]
pub enum SaleCommand {
    /// Record a sale that is not yet settled
    Add {
        #[arg(long = "session")]
        session_id: String,
        #[arg(long)]
        reference: String,
        /// Sale amount in minor units
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
        /// Some tender already collected
        #[arg(long)]
        partially_paid: bool,
    },

    /// Mark a sale fully collected
    Settle { sale_id: String },

    /// Mark a sale abandoned
    Cancel { sale_id: String },

    /// Sales of a session (unsettled only with --unsettled)
    List {
        session_id: String,
        #[arg(long)]
        unsettled: bool,
    },
}

pub async fn run(engine: &SessionEngine, command: SaleCommand) -> Result<Value, ApiError> {
    let sales = engine.database().pending_sales();

    match command {
        SaleCommand::Add {
            session_id,
            reference,
            amount,
            partially_paid,
        } => {
            let amount = Money::from_cents(amount);
            validation::validate_movement_amount(amount)?;
            if reference.trim().is_empty() {
                return Err(CoreError::from(ValidationError::Required {
                    field: "reference".to_string(),
                })
                .into());
            }
            validation::validate_reference(Some(&reference)).map_err(CoreError::from)?;

            // Surfaces SESSION_NOT_FOUND instead of a foreign key failure
            engine.get_session(&session_id).await?;

            let status = if partially_paid {
                SettlementStatus::PartiallyPaid
            } else {
                SettlementStatus::Pending
            };
            to_json(&sales.record(&session_id, reference.trim(), amount, status).await?)
        }
        SaleCommand::Settle { sale_id } => to_json(&sales.mark_settled(&sale_id).await?),
        SaleCommand::Cancel { sale_id } => to_json(&sales.mark_cancelled(&sale_id).await?),
        SaleCommand::List {
            session_id,
            unsettled,
        } => {
            if unsettled {
                to_json(&engine.unsettled_sales(&session_id).await?)
            } else {
                to_json(&sales.list_for_session(&session_id).await?)
            }
        }
    }
}

//! # Register Commands

use clap::Subcommand;
use serde_json::Value;

use drawer_core::validation;
use drawer_db::Database;

use super::to_json;
use crate::error::ApiError;

#[derive(Subcommand, Debug)]
pub enum RegisterCommand {
    /// Add a register to the directory
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: Option<String>,
    },

    /// List registers (active only unless --all)
    List {
        #[arg(long)]
        all: bool,
    },

    /// Allow sessions to be opened on a register
    Enable { register_id: String },

    /// Stop new sessions on a register; open ones are unaffected
    Disable { register_id: String },
}

pub async fn run(db: &Database, command: RegisterCommand) -> Result<Value, ApiError> {
    match command {
        RegisterCommand::Add {
            code,
            name,
            location,
        } => {
            validation::validate_register_code(&code)
                .and_then(|_| validation::validate_register_name(&name))
                .map_err(|e| ApiError::validation(e.to_string()))?;

            let register = db
                .registers()
                .create(code.trim(), name.trim(), location.as_deref())
                .await?;
            to_json(&register)
        }
        RegisterCommand::List { all } => to_json(&db.registers().list(all).await?),
        RegisterCommand::Enable { register_id } => set_active(db, &register_id, true).await,
        RegisterCommand::Disable { register_id } => set_active(db, &register_id, false).await,
    }
}

async fn set_active(db: &Database, register_id: &str, active: bool) -> Result<Value, ApiError> {
    to_json(&db.registers().set_active(register_id, active).await?)
}

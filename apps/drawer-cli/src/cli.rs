//! # Command Line
//!
//! ```text
//! drawer [--config PATH] [--database PATH] <command>
//!
//!   register   add | list | enable | disable
//!   session    open | record | balance | close | list-open | report | by-date | movements
//!   sale       add | settle | cancel | list
//!   outbox     pending | ack | fail
//!   status     database health and migration state
//! ```
//!
//! Amounts are integer minor units (`--float 50000` is 500.00).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::outbox::OutboxCommand;
use crate::commands::register::RegisterCommand;
use crate::commands::sale::SaleCommand;
use crate::commands::session::SessionCommand;

#[derive(Parser, Debug)]
#[command(name = "drawer")]
#[command(about = "Cash drawer sessions: open, record, reconcile, close")]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir, `drawer.toml`).
    #[arg(long, global = true, env = "DRAWER_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file, overriding the configured one.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the register directory
    #[command(subcommand)]
    Register(RegisterCommand),

    /// Session lifecycle and reconciliation
    #[command(subcommand)]
    Session(SessionCommand),

    /// Sales awaiting settlement
    #[command(subcommand)]
    Sale(SaleCommand),

    /// Closed-session totals queued for the accounting poster
    #[command(subcommand)]
    Outbox(OutboxCommand),

    /// Database health and migration state
    Status,
}

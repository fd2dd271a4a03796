//! # Drawer CLI Library
//!
//! Everything behind the `drawer` binary, kept in a library so the commands
//! are testable against an in-memory database.
//!
//! ## Module Organization
//! ```text
//! drawer_cli/
//! ├── lib.rs          ◄─── Startup: config, logging, database, engine
//! ├── cli.rs          ◄─── clap definitions
//! ├── config.rs       ◄─── AppConfig (defaults, TOML, environment)
//! ├── error.rs        ◄─── ApiError envelope
//! └── commands/
//!     ├── mod.rs      ◄─── Dispatch and status
//!     ├── register.rs
//!     ├── session.rs
//!     ├── sale.rs
//!     └── outbox.rs
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Load AppConfig ── --config / platform dir, then DRAWER_* env        │
//! │  2. Initialize tracing ── stderr, RUST_LOG over logging.filter          │
//! │  3. Open database ── --database over database.path, run migrations      │
//! │  4. Build SessionEngine ── business date offset from config             │
//! │  5. Execute command ── JSON to stdout                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use drawer_db::{Database, DbConfig};
use drawer_engine::SessionEngine;

use cli::Cli;
use config::AppConfig;
use error::ApiError;

/// Runs one parsed command line to completion.
pub async fn run(cli: Cli) -> Result<Value, ApiError> {
    let mut config = AppConfig::load(cli.config.clone())?;
    if let Some(path) = cli.database {
        config.database.path = Some(path);
    }

    init_tracing(&config.logging.filter);

    let engine = build_engine(&config).await?;
    let result = commands::execute(&engine, cli.command).await;

    engine.database().close().await;
    result
}

/// Opens the configured database and wires the engine to it.
pub async fn build_engine(config: &AppConfig) -> Result<SessionEngine, ApiError> {
    let engine_config = config.engine_config()?;
    let db_path = config.database_path()?;
    debug!(?db_path, "Database path determined");

    let db = Database::new(
        DbConfig::new(db_path).max_connections(config.database.max_connections),
    )
    .await?;
    info!(
        utc_offset_minutes = engine_config.offset_minutes(),
        "Database connected and migrations applied"
    );

    Ok(SessionEngine::new(db, engine_config))
}

/// Installs the tracing subscriber on stderr.
///
/// `RUST_LOG` takes precedence over the configured filter. Calling this
/// twice is harmless.
fn init_tracing(configured_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

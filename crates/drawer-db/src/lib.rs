//! # drawer-db: Database Layer for the Cash Session Engine
//!
//! SQLite storage for registers, sessions, the movement ledger, pending
//! sales and the posting outbox, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cash Session Data Flow                           │
//! │                                                                         │
//! │  SessionEngine (drawer-engine)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     drawer-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ RegisterRepo   │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SessionRepo    │   │ 001_initial_ │  │   │
//! │  │   │ WAL, FKs,     │    │ MovementRepo   │   │   schema.sql │  │   │
//! │  │   │ busy_timeout  │    │ PendingSale... │   │              │  │   │
//! │  │   │               │    │ PostingOutbox  │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (drawer.db)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drawer_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("drawer.db")).await?;
//! let movements = db.movements().list_for_session(&session_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

pub use repository::movement::MovementRepository;
pub use repository::outbox::PostingOutboxRepository;
pub use repository::pending_sale::PendingSaleRepository;
pub use repository::register::RegisterRepository;
pub use repository::session::{CloseOutcome, CloseRequest, OpenOutcome, SessionRepository};

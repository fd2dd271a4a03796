//! # Repository Module
//!
//! Database repository implementations for the cash session store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  SessionEngine                                                         │
//! │       │                                                                 │
//! │       │  db.sessions().open_unique(&session)                           │
//! │       ▼                                                                 │
//! │  SessionRepository                                                     │
//! │  ├── open_unique(&self, session)   ← one transaction                   │
//! │  ├── close(&self, id, counted, ..) ← one transaction + outbox row      │
//! │  ├── get(&self, id)                                                    │
//! │  └── list_open / list_for_date                                         │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`RegisterRepository`](register::RegisterRepository) - Register directory
//! - [`SessionRepository`](session::SessionRepository) - Session lifecycle rows
//! - [`MovementRepository`](movement::MovementRepository) - Append-only ledger
//! - [`PendingSaleRepository`](pending_sale::PendingSaleRepository) - Unsettled sales
//! - [`PostingOutboxRepository`](outbox::PostingOutboxRepository) - Closed totals queue

pub mod movement;
pub mod outbox;
pub mod pending_sale;
pub mod register;
pub mod session;

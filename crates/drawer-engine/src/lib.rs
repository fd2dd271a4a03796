//! # drawer-engine: Session Lifecycle Engine
//!
//! Opens, tracks, reconciles and closes point-of-sale cash sessions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  drawer-cli / any RPC front end                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  drawer-engine (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   SessionEngine ──► SettlementGate ──► SettlementSource (trait) │   │
//! │  │        │                                                        │   │
//! │  │        └──────────► RegisterDirectory (trait)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  drawer-core (fold, variance, rules)   drawer-db (SQLite)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`engine`] - [`SessionEngine`]: Open, RecordMovement,
//!   ComputeTheoreticalBalance, Close and the read queries
//! - [`gate`] - the pending-settlement gate
//! - [`directory`] - trait seams for the register directory and the
//!   unsettled-sale source
//! - [`config`] - business-date offset
//! - [`error`] - [`EngineError`]

pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod gate;

pub use config::EngineConfig;
pub use directory::{RegisterDirectory, SettlementSource};
pub use engine::{CloseReport, CloseSession, OpenSession, SessionEngine};
pub use error::{EngineError, EngineResult};
pub use gate::SettlementGate;

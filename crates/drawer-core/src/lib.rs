//! # drawer-core: Pure Logic for Cash Sessions
//!
//! This crate holds the arithmetic and the rules of the cash session engine
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Drawer Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 drawer-cli / other callers                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           drawer-engine (Open / Record / Close)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ drawer-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌──────────────┐  ┌─────────┐  │   │
//! │  │   │   types   │  │  ledger   │  │reconciliation│  │validation│ │   │
//! │  │   │ Session   │  │ sign table│  │ gate, close  │  │  rules  │  │   │
//! │  │   │ Movement  │  │ fold      │  │ figures      │  │         │  │   │
//! │  │   └───────────┘  └───────────┘  └──────────────┘  └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    drawer-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CashRegister, CashSession, CashMovement, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`ledger`] - Movement sign convention and the theoretical balance fold
//! - [`reconciliation`] - Pending-settlement decision and closing figures
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use drawer_core::ledger::theoretical_balance;
//! use drawer_core::money::Money;
//! use drawer_core::types::MovementKind;
//!
//! let opening = Money::from_cents(50_000);
//! let movements = [
//!     (MovementKind::Sale, Money::from_cents(12_000)),
//!     (MovementKind::CashOut, Money::from_cents(2_000)),
//!     (MovementKind::Expense, Money::from_cents(500)),
//! ];
//!
//! let balance = theoretical_balance(opening, movements);
//! assert_eq!(balance.cents(), 59_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod reconciliation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{LedgerTotals, Polarity};
pub use money::Money;
pub use reconciliation::{ClosingFigures, SettlementCheck};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest amount accepted for a float, a movement or a count
/// (100 billion in major units). Keeps every ledger fold and variance well
/// inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000_000;

/// Maximum length of a period label ("Morning", "Night shift", ...).
pub const MAX_PERIOD_LABEL_LEN: usize = 50;

/// Maximum length of a movement description.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length of closing notes.
pub const MAX_NOTES_LEN: usize = 1000;

/// Maximum length of an external reference (receipt or invoice number).
pub const MAX_REFERENCE_LEN: usize = 100;

//! # Domain Types
//!
//! Core domain types of the cash session engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │  CashRegister   │   │    CashSession      │   │  CashMovement   │   │
//! │  │  ─────────────  │   │  ─────────────────  │   │  ─────────────  │   │
//! │  │  id (UUID)      │◄──│  register_id        │◄──│  session_id     │   │
//! │  │  code           │   │  period_label       │   │  kind           │   │
//! │  │  is_active      │   │  business_date      │   │  amount_cents   │   │
//! │  └─────────────────┘   │  status Open/Closed │   │  (magnitude)    │   │
//! │                        │  frozen figures     │   └─────────────────┘   │
//! │                        └─────────────────────┘                          │
//! │                                  ▲                                      │
//! │                        ┌─────────┴───────┐                              │
//! │                        │  PendingSale    │  (external, read-only)       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are stored as `*_cents: i64` and exposed as [`Money`]
//! through accessors, the same shape the rows have in the database.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::{self, LedgerTotals};
use crate::money::Money;

// =============================================================================
// Cash Register
// =============================================================================

/// A physical cash register (drawer) known to the register directory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegister {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human code printed on the till ("CAJA-01").
    pub code: String,

    /// Display name.
    pub name: String,

    /// Where the register stands (counter, drive-through window, ...).
    pub location: Option<String>,

    /// Inactive registers cannot open sessions.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Last time a session was opened on this register.
    #[ts(as = "Option<String>")]
    pub last_opened_at: Option<DateTime<Utc>>,
}

/// The only view of a register the engine needs: identity and activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterStatus {
    pub id: String,
    pub active: bool,
}

impl From<&CashRegister> for RegisterStatus {
    fn from(register: &CashRegister) -> Self {
        RegisterStatus {
            id: register.id.clone(),
            active: register.is_active,
        }
    }
}

// =============================================================================
// Session State
// =============================================================================

/// Lifecycle state of a cash session.
///
/// `Open` → `Closed`, exactly once. There is no reopening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Drawer in custody of an operator; movements accepted.
    Open,
    /// Terminal. Figures frozen.
    Closed,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Open
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Open => write!(f, "open"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

// =============================================================================
// Cash Session
// =============================================================================

/// One operator's accountable period of custody over a register's drawer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    pub register_id: String,
    pub operator_id: String,

    /// Daypart tag ("Morning", "Evening").
    pub period_label: String,

    /// Business date the session belongs to (uniqueness key with
    /// register and period).
    #[ts(as = "String")]
    pub business_date: NaiveDate,

    pub status: SessionState,

    /// Money placed in the drawer at start.
    pub opening_float_cents: i64,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,

    /// Physically counted amount at close.
    pub counted_closing_cents: Option<i64>,

    /// Theoretical balance frozen at close. Authoritative once set.
    pub theoretical_closing_cents: Option<i64>,

    /// counted - theoretical. Positive = surplus, negative = shortfall.
    pub variance_cents: Option<i64>,

    pub notes: Option<String>,

    /// Closed with `force = true` past unsettled sales.
    pub force_closed: bool,

    /// Number of unsettled sales overridden by a forced close.
    pub unsettled_at_close: i64,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CashSession {
    /// Returns true while the session accepts movements.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionState::Open
    }

    /// Fails with `SessionNotOpen` unless the session is open.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::not_open(&self.id))
        }
    }

    /// Returns the opening float as Money.
    #[inline]
    pub fn opening_float(&self) -> Money {
        Money::from_cents(self.opening_float_cents)
    }

    /// Returns the theoretical balance frozen at close, if closed.
    #[inline]
    pub fn frozen_theoretical(&self) -> Option<Money> {
        self.theoretical_closing_cents.map(Money::from_cents)
    }

    /// Returns the counted closing amount, if closed.
    #[inline]
    pub fn counted_closing(&self) -> Option<Money> {
        self.counted_closing_cents.map(Money::from_cents)
    }

    /// Returns the stored variance, if closed.
    #[inline]
    pub fn variance(&self) -> Option<Money> {
        self.variance_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Movement Kind
// =============================================================================

/// The closed set of monetary events a session ledger records.
///
/// Direction is intrinsic to the kind; see [`ledger::polarity`] for the
/// sign table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Manual cash added to the drawer.
    CashIn,
    /// Manual cash taken out of the drawer.
    CashOut,
    /// Cash sale.
    Sale,
    /// Cash returned to a customer.
    Refund,
    /// Petty-cash expense paid from the drawer.
    Expense,
}

impl MovementKind {
    /// Every kind, in display order.
    pub const ALL: [MovementKind; 5] = [
        MovementKind::CashIn,
        MovementKind::Sale,
        MovementKind::CashOut,
        MovementKind::Refund,
        MovementKind::Expense,
    ];

    /// Stable snake_case name used in storage and on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementKind::CashIn => "cash_in",
            MovementKind::CashOut => "cash_out",
            MovementKind::Sale => "sale",
            MovementKind::Refund => "refund",
            MovementKind::Expense => "expense",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "cash_in" => Ok(MovementKind::CashIn),
            "cash_out" => Ok(MovementKind::CashOut),
            "sale" => Ok(MovementKind::Sale),
            "refund" => Ok(MovementKind::Refund),
            "expense" => Ok(MovementKind::Expense),
            other => Err(ValidationError::InvalidFormat {
                field: "kind".to_string(),
                reason: format!(
                    "unknown movement kind '{}'; expected cash_in, cash_out, sale, refund or expense",
                    other
                ),
            }),
        }
    }
}

// =============================================================================
// Cash Movement
// =============================================================================

/// One immutable monetary event on a session's ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub session_id: String,
    pub kind: MovementKind,

    /// Non-negative magnitude; the kind supplies the sign.
    pub amount_cents: i64,

    pub description: String,

    /// Receipt or invoice number.
    pub reference: Option<String>,

    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

impl CashMovement {
    /// Returns the magnitude as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Returns this movement's signed contribution to the drawer balance.
    #[inline]
    pub fn contribution(&self) -> Money {
        ledger::signed_contribution(self.kind, self.amount())
    }
}

/// Caller input for RecordMovement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub amount: Money,
    pub description: String,
    pub reference: Option<String>,
}

impl NewMovement {
    pub fn new(kind: MovementKind, amount: Money, description: impl Into<String>) -> Self {
        NewMovement {
            kind,
            amount,
            description: description.into(),
            reference: None,
        }
    }

    /// Attaches an external reference (receipt/invoice number).
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

// =============================================================================
// Pending Sale
// =============================================================================

/// Settlement state of a sale tied to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Nothing collected yet.
    Pending,
    /// Some tender collected, balance outstanding.
    PartiallyPaid,
    /// Fully collected.
    Settled,
    /// Abandoned.
    Cancelled,
}

impl SettlementStatus {
    /// Terminal states no longer block a session close.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, SettlementStatus::Settled | SettlementStatus::Cancelled)
    }
}

/// A sale tied to a session that has not reached a settled state.
///
/// The engine only cares that it exists; the fields are carried back to the
/// caller so the operator can find and settle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PendingSale {
    pub id: String,
    pub session_id: String,
    pub reference: String,
    pub amount_cents: i64,
    pub status: SettlementStatus,
}

impl PendingSale {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// Everything the reporting projection reads for one session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionReport {
    pub session: CashSession,
    pub movements: Vec<CashMovement>,
    pub totals: LedgerTotals,
}

/// Frozen figures of a closed session, handed to the accounting poster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClosedSessionTotals {
    pub session_id: String,
    pub register_id: String,
    pub operator_id: String,
    pub period_label: String,
    #[ts(as = "String")]
    pub business_date: NaiveDate,
    pub opening_float_cents: i64,
    pub totals: LedgerTotals,
    pub theoretical_closing_cents: i64,
    pub counted_closing_cents: i64,
    pub variance_cents: i64,
    pub force_closed: bool,
}

/// An entry in the posting outbox drained by the accounting poster.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PostingOutboxEntry {
    pub id: String,
    pub session_id: String,
    /// `ClosedSessionTotals` as JSON.
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub posted_at: Option<DateTime<Utc>>,
}

impl PostingOutboxEntry {
    /// Decodes the queued closing figures.
    pub fn totals(&self) -> serde_json::Result<ClosedSessionTotals> {
        serde_json::from_str(&self.payload)
    }

    pub fn is_posted(&self) -> bool {
        self.posted_at.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Reconciliation
//!
//! The pure half of Close(): the pending-settlement decision and the closing
//! figures.
//!
//! ## Close Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Close(session, counted, force)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_pending(unsettled, force)                                        │
//! │       ├── none                 ──► Clear                                │
//! │       ├── some, force = false  ──► PendingSettlementsExist (soft stop)  │
//! │       └── some, force = true   ──► Overridden { count } (recorded)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ClosingFigures::compute(session, movements, counted, check)            │
//! │       theoretical = fold(opening, movements)                            │
//! │       variance    = counted - theoretical                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ledger::{self, LedgerTotals};
use crate::money::Money;
use crate::types::{CashMovement, CashSession, ClosedSessionTotals, PendingSale};
use crate::validation;

// =============================================================================
// Pending-Settlement Decision
// =============================================================================

/// Outcome of the pending-settlement gate for one close attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SettlementCheck {
    /// No unsettled sales.
    Clear,
    /// Unsettled sales exist and the operator forced the close anyway.
    Overridden { sales: Vec<PendingSale> },
}

impl SettlementCheck {
    /// Number of unsettled sales the close went past.
    pub fn overridden_count(&self) -> usize {
        match self {
            SettlementCheck::Clear => 0,
            SettlementCheck::Overridden { sales } => sales.len(),
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self, SettlementCheck::Overridden { .. })
    }
}

/// Decides whether unsettled sales block a close.
///
/// Sales already in a terminal state are ignored even if a source hands
/// them over.
pub fn check_pending(
    session_id: &str,
    sales: Vec<PendingSale>,
    force: bool,
) -> CoreResult<SettlementCheck> {
    let unsettled: Vec<PendingSale> = sales
        .into_iter()
        .filter(|sale| !sale.status.is_terminal())
        .collect();

    if unsettled.is_empty() {
        return Ok(SettlementCheck::Clear);
    }

    if !force {
        return Err(CoreError::PendingSettlementsExist {
            session_id: session_id.to_string(),
            sales: unsettled,
        });
    }

    Ok(SettlementCheck::Overridden { sales: unsettled })
}

// =============================================================================
// Closing Figures
// =============================================================================

/// Figures written to a session when it closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingFigures {
    pub theoretical: Money,
    pub counted: Money,
    pub variance: Money,
    pub totals: LedgerTotals,
    pub force_closed: bool,
    pub unsettled_at_close: i64,
}

impl ClosingFigures {
    /// Computes the closing figures for an open session.
    ///
    /// Fails with `SessionNotOpen` for a closed session and `InvalidAmount`
    /// for a negative count.
    pub fn compute(
        session: &CashSession,
        movements: &[CashMovement],
        counted: Money,
        check: &SettlementCheck,
    ) -> CoreResult<Self> {
        session.ensure_open()?;
        validation::validate_counted_amount(counted)?;

        Ok(Self::from_ledger(session, movements, counted, check))
    }

    /// Folds the figures without re-checking the session state.
    ///
    /// For callers that already hold the open row under a write lock.
    pub fn from_ledger(
        session: &CashSession,
        movements: &[CashMovement],
        counted: Money,
        check: &SettlementCheck,
    ) -> Self {
        let theoretical = ledger::fold_movements(session.opening_float(), movements);

        ClosingFigures {
            theoretical,
            counted,
            variance: ledger::variance(counted, theoretical),
            totals: LedgerTotals::from_movements(movements),
            force_closed: check.is_forced(),
            unsettled_at_close: check.overridden_count() as i64,
        }
    }

    /// The poster-facing snapshot of a session closed with these figures.
    pub fn frozen_totals(&self, session: &CashSession) -> ClosedSessionTotals {
        ClosedSessionTotals {
            session_id: session.id.clone(),
            register_id: session.register_id.clone(),
            operator_id: session.operator_id.clone(),
            period_label: session.period_label.clone(),
            business_date: session.business_date,
            opening_float_cents: session.opening_float_cents,
            totals: self.totals.clone(),
            theoretical_closing_cents: self.theoretical.cents(),
            counted_closing_cents: self.counted.cents(),
            variance_cents: self.variance.cents(),
            force_closed: self.force_closed,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

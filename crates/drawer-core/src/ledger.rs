//! # Movement Ledger Arithmetic
//!
//! The sign convention and the theoretical balance fold.
//!
//! ## Sign Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Callers always submit a non-negative magnitude.                        │
//! │  The kind decides the direction:                                        │
//! │                                                                         │
//! │     cash_in   ──► +amount        cash_out ──► -amount                   │
//! │     sale      ──► +amount        refund   ──► -amount                   │
//! │                                  expense  ──► -amount                   │
//! │                                                                         │
//! │  theoretical = opening_float + Σ signed contributions                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`polarity`] is the only place the table exists. Recording, folding and
//! reporting all go through it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CashMovement, MovementKind};

// =============================================================================
// Polarity
// =============================================================================

/// Direction a movement moves cash relative to the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Inflow,
    Outflow,
}

/// The sign table.
pub const fn polarity(kind: MovementKind) -> Polarity {
    match kind {
        MovementKind::CashIn | MovementKind::Sale => Polarity::Inflow,
        MovementKind::CashOut | MovementKind::Refund | MovementKind::Expense => Polarity::Outflow,
    }
}

/// Signed contribution of `amount` (a magnitude) recorded as `kind`.
#[inline]
pub fn signed_contribution(kind: MovementKind, amount: Money) -> Money {
    match polarity(kind) {
        Polarity::Inflow => amount,
        Polarity::Outflow => -amount,
    }
}

// =============================================================================
// Fold
// =============================================================================

/// Folds `(kind, magnitude)` pairs onto an opening float.
///
/// Pure: the same opening and the same multiset of movements always give the
/// same result, in any order.
///
/// ## Example
/// ```rust
/// use drawer_core::ledger::theoretical_balance;
/// use drawer_core::money::Money;
/// use drawer_core::types::MovementKind::*;
///
/// let m = |c| Money::from_cents(c);
/// let balance = theoretical_balance(
///     m(1_000),
///     [(CashIn, m(100)), (Sale, m(500)), (CashOut, m(50)), (Expense, m(20)), (Refund, m(30))],
/// );
/// assert_eq!(balance, m(1_500));
/// ```
pub fn theoretical_balance<I>(opening_float: Money, movements: I) -> Money
where
    I: IntoIterator<Item = (MovementKind, Money)>,
{
    movements
        .into_iter()
        .fold(opening_float, |balance, (kind, amount)| {
            balance + signed_contribution(kind, amount)
        })
}

/// Folds stored movements onto an opening float.
pub fn fold_movements(opening_float: Money, movements: &[CashMovement]) -> Money {
    theoretical_balance(opening_float, movements.iter().map(|m| (m.kind, m.amount())))
}

/// Counted minus theoretical. Positive = surplus, negative = shortfall.
#[inline]
pub fn variance(counted: Money, theoretical: Money) -> Money {
    counted - theoretical
}

// =============================================================================
// Ledger Totals
// =============================================================================

/// Per-kind magnitudes of a session's movements.
///
/// Used by the reporting projection and the posting outbox payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerTotals {
    pub cash_in_cents: i64,
    pub sales_cents: i64,
    pub cash_out_cents: i64,
    pub refunds_cents: i64,
    pub expenses_cents: i64,
    pub movement_count: i64,
}

impl LedgerTotals {
    /// Aggregates a movement list.
    pub fn from_movements(movements: &[CashMovement]) -> Self {
        movements.iter().fold(LedgerTotals::default(), |mut totals, m| {
            totals.add(m.kind, m.amount());
            totals
        })
    }

    /// Adds one movement to the totals.
    pub fn add(&mut self, kind: MovementKind, amount: Money) {
        let slot = match kind {
            MovementKind::CashIn => &mut self.cash_in_cents,
            MovementKind::Sale => &mut self.sales_cents,
            MovementKind::CashOut => &mut self.cash_out_cents,
            MovementKind::Refund => &mut self.refunds_cents,
            MovementKind::Expense => &mut self.expenses_cents,
        };
        *slot += amount.cents();
        self.movement_count += 1;
    }

    /// Total magnitude recorded for `kind`.
    pub fn total_for(&self, kind: MovementKind) -> Money {
        Money::from_cents(match kind {
            MovementKind::CashIn => self.cash_in_cents,
            MovementKind::Sale => self.sales_cents,
            MovementKind::CashOut => self.cash_out_cents,
            MovementKind::Refund => self.refunds_cents,
            MovementKind::Expense => self.expenses_cents,
        })
    }

    /// Net signed contribution of all movements, via the sign table.
    pub fn net(&self) -> Money {
        MovementKind::ALL
            .iter()
            .map(|&kind| signed_contribution(kind, self.total_for(kind)))
            .sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Error Types
//!
//! Domain-specific error types for drawer-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  drawer-core errors (this file)                                        │
//! │  ├── CoreError        - Session lifecycle rule violations              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  drawer-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  drawer-engine errors                                                  │
//! │  └── EngineError      - CoreError | DbError                            │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - What callers see (serialized)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries the offending session or register id so the caller
//! can act on it. Only [`CoreError::PendingSettlementsExist`] is meant to be
//! resolved by a follow-up call; the rest are terminal for the call.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::PendingSale;

// =============================================================================
// Core Error
// =============================================================================

/// Cash session rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An open session already exists for (register, period, business date).
    ///
    /// ## When This Occurs
    /// ```text
    /// Open(R1, "Morning", 2026-10-19) ──► session A (open)
    /// Open(R1, "Morning", 2026-10-19) ──► DuplicateOpenSession { existing: A }
    /// Open(R1, "Evening", 2026-10-19) ──► session B (different period, fine)
    /// ```
    #[error(
        "Register {register_id} already has an open '{period_label}' session for {business_date}"
    )]
    DuplicateOpenSession {
        register_id: String,
        period_label: String,
        business_date: NaiveDate,
        existing_session_id: Option<String>,
    },

    /// Register is disabled in the register directory.
    #[error("Register {register_id} is inactive")]
    RegisterInactive { register_id: String },

    /// Register id is unknown to the register directory.
    #[error("Register not found: {register_id}")]
    RegisterNotFound { register_id: String },

    /// Session is missing or already closed.
    ///
    /// Returned by RecordMovement and Close. A closed session never accepts
    /// another movement, so its frozen balance stays reproducible.
    #[error("Session {session_id} is not open")]
    SessionNotOpen { session_id: String },

    /// Session id is unknown (read paths only).
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Monetary input outside its allowed range.
    #[error("Invalid {field}: {amount_cents} (minor units)")]
    InvalidAmount { field: String, amount_cents: i64 },

    /// Close blocked by sales that have not settled.
    ///
    /// ## User Workflow
    /// ```text
    /// Close(S, counted, force = false)
    ///      │
    ///      ▼
    /// PendingSettlementsExist { sales: [INV-0042 $0.75] }
    ///      │
    ///      ├── settle INV-0042, then Close(S, counted)
    ///      └── or Close(S, counted, force = true)   (recorded override)
    /// ```
    #[error("Session {session_id} has {} unsettled sale(s)", .sales.len())]
    PendingSettlementsExist {
        session_id: String,
        sales: Vec<PendingSale>,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a SessionNotOpen error.
    pub fn not_open(session_id: impl Into<String>) -> Self {
        CoreError::SessionNotOpen {
            session_id: session_id.into(),
        }
    }

    /// Creates an InvalidAmount error.
    pub fn invalid_amount(field: impl Into<String>, amount_cents: i64) -> Self {
        CoreError::InvalidAmount {
            field: field.into(),
            amount_cents,
        }
    }

    /// True for errors that a follow-up action can resolve.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::PendingSettlementsExist { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before any store is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, unknown movement kind).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

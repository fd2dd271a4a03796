//! # Validation Module
//!
//! Input validation for the cash session operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI / caller                                                 │
//! │  └── Type validation (argument parsing, deserialization)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine                                                       │
//! │  └── THIS MODULE: amounts and text fields, before any store access    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on amounts                                      │
//! │  ├── Partial UNIQUE index on open sessions                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amount rules fail with [`CoreError::InvalidAmount`]; text rules fail with
//! [`ValidationError`].

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::{
    MAX_AMOUNT_CENTS, MAX_DESCRIPTION_LEN, MAX_NOTES_LEN, MAX_PERIOD_LABEL_LEN, MAX_REFERENCE_LEN,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Validators
// =============================================================================

fn within_ceiling(field: &str, amount: Money) -> CoreResult<()> {
    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(CoreError::invalid_amount(field, amount.cents()));
    }
    Ok(())
}

/// Opening float must be ≥ 0. Zero is a legitimate empty drawer.
pub fn validate_opening_float(amount: Money) -> CoreResult<()> {
    within_ceiling("opening_float", amount)?;
    if amount.is_negative() {
        return Err(CoreError::invalid_amount("opening_float", amount.cents()));
    }
    Ok(())
}

/// Movement magnitude must be > 0. The kind carries the direction.
///
/// ## Example
/// ```rust
/// use drawer_core::money::Money;
/// use drawer_core::validation::validate_movement_amount;
///
/// assert!(validate_movement_amount(Money::from_cents(1)).is_ok());
/// assert!(validate_movement_amount(Money::zero()).is_err());
/// assert!(validate_movement_amount(Money::from_cents(-100)).is_err());
/// ```
pub fn validate_movement_amount(amount: Money) -> CoreResult<()> {
    within_ceiling("amount", amount)?;
    if !amount.is_positive() {
        return Err(CoreError::invalid_amount("amount", amount.cents()));
    }
    Ok(())
}

/// Counted closing amount must be ≥ 0.
pub fn validate_counted_amount(amount: Money) -> CoreResult<()> {
    within_ceiling("counted_amount", amount)?;
    if amount.is_negative() {
        return Err(CoreError::invalid_amount("counted_amount", amount.cents()));
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

fn required_within(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

fn optional_within(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a period label ("Morning", "Evening").
pub fn validate_period_label(label: &str) -> ValidationResult<()> {
    required_within("period_label", label, MAX_PERIOD_LABEL_LEN)
}

/// Validates an operator reference.
pub fn validate_operator_id(operator_id: &str) -> ValidationResult<()> {
    required_within("operator_id", operator_id, 100)
}

/// Validates a movement description. Empty is allowed.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    optional_within("description", Some(description), MAX_DESCRIPTION_LEN)
}

/// Validates an optional external reference.
pub fn validate_reference(reference: Option<&str>) -> ValidationResult<()> {
    if let Some(r) = reference {
        if r.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "reference".to_string(),
            });
        }
    }
    optional_within("reference", reference, MAX_REFERENCE_LEN)
}

/// Validates optional closing notes.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    optional_within("notes", notes, MAX_NOTES_LEN)
}

/// Validates a register code.
///
/// ## Rules
/// - Must not be empty, at most 20 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use drawer_core::validation::validate_register_code;
///
/// assert!(validate_register_code("CAJA-01").is_ok());
/// assert!(validate_register_code("").is_err());
/// assert!(validate_register_code("CAJA 01").is_err());
/// ```
pub fn validate_register_code(code: &str) -> ValidationResult<()> {
    required_within("code", code, 20)?;

    if !code
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a register display name.
pub fn validate_register_name(name: &str) -> ValidationResult<()> {
    required_within("name", name, 200)
}

// =============================================================================
// Unit Tests
// =============================================================================

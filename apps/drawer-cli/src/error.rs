//! # API Error Type
//!
//! The error envelope every command fails with.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  drawer session close S1 --counted 950                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │  EngineError::Core(..) ─── CoreError ───────┐                    │  │
//! │  │  EngineError::Db(..)   ─── DbError ─────────┼──► ApiError        │  │
//! │  │  ConfigError ───────────────────────────────┘                    │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stderr: {"code":"PENDING_SETTLEMENTS_EXIST","message":..,"details":..} │
//! │  exit status 1                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use serde_json::json;

use drawer_core::CoreError;
use drawer_db::DbError;
use drawer_engine::EngineError;

use crate::config::ConfigError;

/// Serialized command failure.
///
/// ```json
/// {
///   "code": "DUPLICATE_OPEN_SESSION",
///   "message": "Register R1 already has an open 'Morning' session for 2026-10-19",
///   "details": { "existingSessionId": "9b2f..." }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message
    pub message: String,

    /// Structured context the caller can act on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    DuplicateOpenSession,
    RegisterInactive,
    RegisterNotFound,
    SessionNotOpen,
    SessionNotFound,
    InvalidAmount,
    PendingSettlementsExist,
    ValidationError,
    /// Entity other than a register or session is missing
    NotFound,
    /// Write refused because the row is in a terminal state
    Conflict,
    DatabaseError,
    ConfigError,
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts domain errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::DuplicateOpenSession {
                register_id,
                period_label,
                business_date,
                existing_session_id,
            } => ApiError::new(ErrorCode::DuplicateOpenSession, message).with_details(json!({
                "registerId": register_id,
                "periodLabel": period_label,
                "businessDate": business_date,
                "existingSessionId": existing_session_id,
            })),
            CoreError::RegisterInactive { register_id } => {
                ApiError::new(ErrorCode::RegisterInactive, message)
                    .with_details(json!({ "registerId": register_id }))
            }
            CoreError::RegisterNotFound { register_id } => {
                ApiError::new(ErrorCode::RegisterNotFound, message)
                    .with_details(json!({ "registerId": register_id }))
            }
            CoreError::SessionNotOpen { session_id } => {
                ApiError::new(ErrorCode::SessionNotOpen, message)
                    .with_details(json!({ "sessionId": session_id }))
            }
            CoreError::SessionNotFound { session_id } => {
                ApiError::new(ErrorCode::SessionNotFound, message)
                    .with_details(json!({ "sessionId": session_id }))
            }
            CoreError::InvalidAmount {
                field,
                amount_cents,
            } => ApiError::new(ErrorCode::InvalidAmount, message)
                .with_details(json!({ "field": field, "amountCents": amount_cents })),
            CoreError::PendingSettlementsExist { session_id, sales } => {
                ApiError::new(ErrorCode::PendingSettlementsExist, message)
                    .with_details(json!({ "sessionId": session_id, "sales": sales }))
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let retryable = err.is_transient();
        let api = match err {
            DbError::NotFound { entity, id } => ApiError::new(
                ErrorCode::NotFound,
                format!("{} not found: {}", entity, id),
            ),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::StateConflict(message) => ApiError::new(ErrorCode::Conflict, message),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Serialization(e) => {
                tracing::error!("Stored payload unreadable: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Stored payload unreadable")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        };

        if retryable {
            api.with_details(json!({ "retryable": true }))
        } else {
            api
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(e) => e.into(),
            EngineError::Db(e) => e.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal(format!("Failed to encode output: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use drawer_core::{PendingSale, SettlementStatus, ValidationError};

    #[test]
    fn test_duplicate_open_carries_existing_id() {
        let err: ApiError = CoreError::DuplicateOpenSession {
            register_id: "R1".into(),
            period_label: "Morning".into(),
            business_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            existing_session_id: Some("S1".into()),
        }
        .into();

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "DUPLICATE_OPEN_SESSION");
        assert_eq!(json["details"]["existingSessionId"], "S1");
        assert_eq!(json["details"]["businessDate"], "2026-10-19");
    }

    #[test]
    fn test_pending_settlements_lists_sales() {
        let sale = PendingSale {
            id: "P1".into(),
            session_id: "S1".into(),
            reference: "INV-0042".into(),
            amount_cents: 75,
            status: SettlementStatus::Pending,
        };
        let err: ApiError = EngineError::Core(CoreError::PendingSettlementsExist {
            session_id: "S1".into(),
            sales: vec![sale],
        })
        .into();

        assert_eq!(err.code, ErrorCode::PendingSettlementsExist);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["details"]["sales"][0]["reference"], "INV-0042");
    }

    #[test]
    fn test_validation_has_no_details() {
        let err: ApiError = CoreError::Validation(ValidationError::Required {
            field: "period_label".into(),
        })
        .into();

        assert_eq!(err.code, ErrorCode::ValidationError);
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_db_errors_hide_internals() {
        let err: ApiError = DbError::QueryFailed("near \"SELEC\": syntax error".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");

        let err: ApiError = DbError::QueryFailed("database is locked".into()).into();
        assert_eq!(err.details.unwrap()["retryable"], true);

        let err: ApiError = DbError::not_found("Register", "R9").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.to_string(), "[NotFound] Register not found: R9");
    }
}

//! # Engine Error Types
//!
//! The engine returns domain failures ([`CoreError`]) and storage failures
//! ([`DbError`]) through one type so callers match once.

use drawer_core::CoreError;
use drawer_db::DbError;
use thiserror::Error;

/// Errors returned by [`SessionEngine`](crate::SessionEngine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl EngineError {
    /// True only for the soft stop a caller resolves with a follow-up
    /// action (settle the sales or re-close with `force`).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::Core(err) if err.is_recoverable())
    }

    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            EngineError::Core(err) => Some(err),
            EngineError::Db(_) => None,
        }
    }
}

impl From<drawer_core::ValidationError> for EngineError {
    fn from(err: drawer_core::ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

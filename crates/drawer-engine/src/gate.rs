//! # Pending-Settlement Gate
//!
//! Stateless: asks the [`SettlementSource`] for a session's unsettled sales
//! and turns the answer into a [`SettlementCheck`]. It never writes.

use tracing::warn;

use drawer_core::reconciliation::check_pending;
use drawer_core::{PendingSale, SettlementCheck};

use crate::directory::SettlementSource;
use crate::error::EngineResult;

/// Wraps a [`SettlementSource`] with the close decision.
#[derive(Debug, Clone)]
pub struct SettlementGate<S> {
    source: S,
}

impl<S: SettlementSource> SettlementGate<S> {
    pub fn new(source: S) -> Self {
        SettlementGate { source }
    }

    /// Sales tied to the session that are not settled or cancelled.
    pub async fn unsettled(&self, session_id: &str) -> EngineResult<Vec<PendingSale>> {
        self.source.list_unsettled_sales(session_id).await
    }

    /// Fails with `PendingSettlementsExist` unless the list is empty or
    /// `force` is set.
    pub async fn check(&self, session_id: &str, force: bool) -> EngineResult<SettlementCheck> {
        let sales = self.unsettled(session_id).await?;
        let check = check_pending(session_id, sales, force)?;

        if check.is_forced() {
            warn!(
                session_id = %session_id,
                unsettled = check.overridden_count(),
                "Close forced past unsettled sales"
            );
        }

        Ok(check)
    }
}

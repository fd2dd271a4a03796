//! # External Collaborators
//!
//! The engine reads two things it does not own:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RegisterDirectory   get_register(id)         -> Option<{id, active}>   │
//! │                      consulted by Open()                                │
//! │                                                                         │
//! │  SettlementSource    list_unsettled_sales(id) -> [PendingSale]          │
//! │                      consulted by Close() (the pending-settlement gate) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both are read-only from the engine's side. The SQLite repositories are
//! the default implementations; a deployment that keeps registers or sales
//! elsewhere supplies its own.

use std::future::Future;

use drawer_core::{PendingSale, RegisterStatus};
use drawer_db::{PendingSaleRepository, RegisterRepository};

use crate::error::EngineResult;

/// Read access to the register directory.
pub trait RegisterDirectory: Send + Sync {
    /// `None` when no register has this id.
    fn get_register(
        &self,
        register_id: &str,
    ) -> impl Future<Output = EngineResult<Option<RegisterStatus>>> + Send;
}

/// Read access to sales that have not reached a terminal settlement state.
pub trait SettlementSource: Send + Sync {
    fn list_unsettled_sales(
        &self,
        session_id: &str,
    ) -> impl Future<Output = EngineResult<Vec<PendingSale>>> + Send;
}

impl RegisterDirectory for RegisterRepository {
    async fn get_register(&self, register_id: &str) -> EngineResult<Option<RegisterStatus>> {
        Ok(self.register_status(register_id).await?)
    }
}

impl SettlementSource for PendingSaleRepository {
    async fn list_unsettled_sales(&self, session_id: &str) -> EngineResult<Vec<PendingSale>> {
        Ok(self.list_unsettled(session_id).await?)
    }
}

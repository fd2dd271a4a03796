//! # Session Lifecycle Engine
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open(register, operator, period, float)                               │
//! │     ├── validate float ≥ 0, period, operator                            │
//! │     ├── RegisterDirectory: exists? active?                              │
//! │     └── SessionRepository::open_unique      ──► Open                    │
//! │                                                │                        │
//! │   record_movement(session, kind, amount)       │  (many, concurrent)    │
//! │     └── single guarded INSERT                  │                        │
//! │                                                ▼                        │
//! │   close(session, counted, notes, force)                                 │
//! │     ├── validate counted ≥ 0                                            │
//! │     ├── SettlementGate::check(force)                                    │
//! │     └── SessionRepository::close            ──► Closed (terminal)       │
//! │           fold, variance, freeze, queue for posting                     │
//! │                                                                         │
//! │   compute_theoretical_balance(session)                                  │
//! │     ├── Open   ──► fold(opening_float, movements)                       │
//! │     └── Closed ──► frozen theoretical_closing                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No background work and no retries: every operation is one request and
//! one response. Retrying is the caller's decision.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use drawer_core::ledger;
use drawer_core::validation;
use drawer_core::{
    CashMovement, CashSession, ClosingFigures, CoreError, LedgerTotals, Money, NewMovement,
    PendingSale, SessionReport, SessionState, SettlementCheck,
};
use drawer_db::{
    CloseOutcome, CloseRequest, Database, DbError, OpenOutcome, PendingSaleRepository,
    RegisterRepository,
};

use crate::config::EngineConfig;
use crate::directory::{RegisterDirectory, SettlementSource};
use crate::error::EngineResult;
use crate::gate::SettlementGate;

// =============================================================================
// Requests and Results
// =============================================================================

/// Input of [`SessionEngine::open`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSession {
    pub register_id: String,
    pub operator_id: String,
    pub period_label: String,
    pub opening_float: Money,
}

/// Input of [`SessionEngine::close`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseSession {
    pub session_id: String,
    pub counted: Money,
    pub notes: Option<String>,
    #[serde(default)]
    pub force: bool,
}

/// What a successful close returns.
#[derive(Debug, Clone, Serialize)]
pub struct CloseReport {
    pub session: CashSession,
    pub figures: ClosingFigures,
    /// Unsettled sales the close went past (empty unless forced).
    pub overridden_sales: Vec<PendingSale>,
}

// =============================================================================
// Engine
// =============================================================================

/// The session lifecycle engine.
///
/// Generic over its two external collaborators; the defaults read them from
/// the same SQLite database.
///
/// ## Example
/// ```rust,ignore
/// let engine = SessionEngine::new(db, EngineConfig::default());
/// let session = engine.open(OpenSession { .. }).await?;
/// engine.record_movement(&session.id, NewMovement::new(MovementKind::Sale, amount, "")).await?;
/// let report = engine.close(CloseSession { .. }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SessionEngine<D = RegisterRepository, S = PendingSaleRepository> {
    db: Database,
    directory: D,
    gate: SettlementGate<S>,
    config: EngineConfig,
}

impl SessionEngine {
    /// Engine whose register directory and settlement source are the
    /// database's own tables.
    pub fn new(db: Database, config: EngineConfig) -> Self {
        let directory = db.registers();
        let settlements = db.pending_sales();
        SessionEngine::with_collaborators(db, directory, settlements, config)
    }
}

impl<D, S> SessionEngine<D, S>
where
    D: RegisterDirectory,
    S: SettlementSource,
{
    pub fn with_collaborators(
        db: Database,
        directory: D,
        settlements: S,
        config: EngineConfig,
    ) -> Self {
        SessionEngine {
            db,
            directory,
            gate: SettlementGate::new(settlements),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Open
    // =========================================================================

    /// Opens a session on an active register.
    ///
    /// ## Errors
    /// - `InvalidAmount` for a negative float
    /// - `Validation` for an empty period label or operator
    /// - `RegisterNotFound`, `RegisterInactive`
    /// - `DuplicateOpenSession` when the register already has an open session
    ///   for this period on today's business date
    pub async fn open(&self, request: OpenSession) -> EngineResult<CashSession> {
        validation::validate_opening_float(request.opening_float)?;
        validation::validate_period_label(&request.period_label)?;
        validation::validate_operator_id(&request.operator_id)?;

        let register_id = request.register_id.trim().to_string();

        let register = self
            .directory
            .get_register(&register_id)
            .await?
            .ok_or_else(|| CoreError::RegisterNotFound {
                register_id: register_id.clone(),
            })?;

        if !register.active {
            return Err(CoreError::RegisterInactive { register_id }.into());
        }

        let now = Utc::now();
        let session = CashSession {
            id: Uuid::new_v4().to_string(),
            register_id,
            operator_id: request.operator_id.trim().to_string(),
            period_label: request.period_label.trim().to_string(),
            business_date: self.config.business_date(now),
            status: SessionState::Open,
            opening_float_cents: request.opening_float.cents(),
            opened_at: now,
            closed_at: None,
            counted_closing_cents: None,
            theoretical_closing_cents: None,
            variance_cents: None,
            notes: None,
            force_closed: false,
            unsettled_at_close: 0,
            updated_at: now,
        };

        match self.db.sessions().open_unique(&session).await {
            Ok(OpenOutcome::Opened) => {}
            Ok(OpenOutcome::Conflict {
                existing_session_id,
            }) => {
                return Err(CoreError::DuplicateOpenSession {
                    register_id: session.register_id,
                    period_label: session.period_label,
                    business_date: session.business_date,
                    existing_session_id,
                }
                .into());
            }
            Err(DbError::NotFound { entity, .. }) if entity == "Register" => {
                return Err(CoreError::RegisterNotFound {
                    register_id: session.register_id,
                }
                .into());
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            session_id = %session.id,
            register_id = %session.register_id,
            period = %session.period_label,
            business_date = %session.business_date,
            opening_float = %request.opening_float,
            "Session opened"
        );

        Ok(session)
    }

    // =========================================================================
    // Record
    // =========================================================================

    /// Appends a movement to an open session.
    ///
    /// The amount is a positive magnitude; the kind decides the sign when
    /// the ledger is folded. Nothing is recomputed here.
    pub async fn record_movement(
        &self,
        session_id: &str,
        movement: NewMovement,
    ) -> EngineResult<CashMovement> {
        validation::validate_movement_amount(movement.amount)?;
        validation::validate_description(&movement.description)?;
        validation::validate_reference(movement.reference.as_deref())?;

        let recorded = self
            .db
            .movements()
            .append(session_id, &movement, Utc::now())
            .await?
            .ok_or_else(|| CoreError::not_open(session_id))?;

        debug!(
            session_id = %session_id,
            movement_id = %recorded.id,
            kind = %recorded.kind,
            contribution = %recorded.contribution(),
            "Movement recorded"
        );

        Ok(recorded)
    }

    // =========================================================================
    // Balance
    // =========================================================================

    /// Opening float plus the signed contributions of every movement.
    ///
    /// For a closed session this is the figure frozen at close.
    pub async fn compute_theoretical_balance(&self, session_id: &str) -> EngineResult<Money> {
        let session = self.get_session(session_id).await?;

        if let Some(frozen) = session.frozen_theoretical() {
            return Ok(frozen);
        }

        let movements = self.db.movements().list_for_session(session_id).await?;
        Ok(ledger::fold_movements(session.opening_float(), &movements))
    }

    // =========================================================================
    // Close
    // =========================================================================

    /// Reconciles and closes a session.
    ///
    /// ## Steps
    /// 1. `counted` must be ≥ 0 and the session open
    /// 2. Unsettled sales stop the close unless `force` is set
    /// 3. Theoretical balance folded from the ledger, variance = counted - theoretical
    /// 4. Figures frozen, state moved to `Closed` and the totals queued for
    ///    the accounting poster, atomically
    ///
    /// A concurrent close of the same session makes exactly one caller win;
    /// the other gets `SessionNotOpen`.
    ///
    /// The settlement gate reads a snapshot taken before the close
    /// transaction. A sale marked pending after that read does not block the
    /// close and is not counted in `unsettled_at_close`.
    pub async fn close(&self, request: CloseSession) -> EngineResult<CloseReport> {
        let CloseSession {
            session_id,
            counted,
            notes,
            force,
        } = request;

        validation::validate_counted_amount(counted)?;
        validation::validate_notes(notes.as_deref())?;

        let session = self
            .db
            .sessions()
            .get(&session_id)
            .await?
            .ok_or_else(|| CoreError::not_open(&session_id))?;
        session.ensure_open()?;

        let check = self.gate.check(&session_id, force).await?;

        let outcome = self
            .db
            .sessions()
            .close(CloseRequest {
                session_id: &session_id,
                counted,
                notes: notes.as_deref(),
                check: &check,
                closed_at: Utc::now(),
            })
            .await?;

        let (session, figures) = match outcome {
            CloseOutcome::Closed { session, figures } => (session, figures),
            CloseOutcome::NotOpen => return Err(CoreError::not_open(&session_id).into()),
        };

        info!(
            session_id = %session.id,
            register_id = %session.register_id,
            theoretical = %figures.theoretical,
            counted = %figures.counted,
            variance = %figures.variance,
            forced = figures.force_closed,
            "Session closed"
        );

        let overridden_sales = match check {
            SettlementCheck::Clear => Vec::new(),
            SettlementCheck::Overridden { sales } => sales,
        };

        Ok(CloseReport {
            session,
            figures,
            overridden_sales,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Open sessions, optionally for one register.
    pub async fn list_open_sessions(
        &self,
        register_id: Option<&str>,
    ) -> EngineResult<Vec<CashSession>> {
        Ok(self.db.sessions().list_open(register_id).await?)
    }

    /// Gets a session, failing with `SessionNotFound`.
    pub async fn get_session(&self, session_id: &str) -> EngineResult<CashSession> {
        self.db
            .sessions()
            .get(session_id)
            .await?
            .ok_or_else(|| {
                CoreError::SessionNotFound {
                    session_id: session_id.to_string(),
                }
                .into()
            })
    }

    /// A session's full movement list, in recording order.
    pub async fn list_movements(&self, session_id: &str) -> EngineResult<Vec<CashMovement>> {
        self.get_session(session_id).await?;
        Ok(self.db.movements().list_for_session(session_id).await?)
    }

    /// Session, movements and per-kind totals in one read model.
    pub async fn session_report(&self, session_id: &str) -> EngineResult<SessionReport> {
        let session = self.get_session(session_id).await?;
        let movements = self.db.movements().list_for_session(session_id).await?;
        let totals = LedgerTotals::from_movements(&movements);

        Ok(SessionReport {
            session,
            movements,
            totals,
        })
    }

    /// All sessions of one business date.
    pub async fn sessions_for_date(
        &self,
        business_date: NaiveDate,
    ) -> EngineResult<Vec<CashSession>> {
        Ok(self.db.sessions().list_for_date(business_date).await?)
    }

    /// What the pending-settlement gate currently sees for a session.
    pub async fn unsettled_sales(&self, session_id: &str) -> EngineResult<Vec<PendingSale>> {
        self.gate.unsettled(session_id).await
    }
}

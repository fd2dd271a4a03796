//! End-to-end lifecycle tests against in-memory SQLite.

use chrono::Utc;
use drawer_core::{
    CashRegister, CoreError, Money, MAX_AMOUNT_CENTS, MovementKind, NewMovement, RegisterStatus, SessionState,
    SettlementStatus,
};
use drawer_db::{Database, DbConfig};
use drawer_engine::{
    CloseSession, EngineConfig, EngineError, EngineResult, OpenSession, RegisterDirectory,
    SessionEngine,
};

// =============================================================================
// Helpers
// =============================================================================

async fn engine() -> SessionEngine {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    SessionEngine::new(db, EngineConfig::default())
}

async fn add_register(engine: &SessionEngine, code: &str) -> CashRegister {
    engine
        .database()
        .registers()
        .create(code, &format!("Register {code}"), Some("Front counter"))
        .await
        .unwrap()
}

fn open_request(register_id: &str, period: &str, float: i64) -> OpenSession {
    OpenSession {
        register_id: register_id.to_string(),
        operator_id: "O1".to_string(),
        period_label: period.to_string(),
        opening_float: Money::from_cents(float),
    }
}

fn close_request(session_id: &str, counted: i64, force: bool) -> CloseSession {
    CloseSession {
        session_id: session_id.to_string(),
        counted: Money::from_cents(counted),
        notes: None,
        force,
    }
}

async fn record(engine: &SessionEngine, session_id: &str, kind: MovementKind, cents: i64) {
    engine
        .record_movement(session_id, NewMovement::new(kind, Money::from_cents(cents), ""))
        .await
        .unwrap();
}

fn core_err(err: EngineError) -> CoreError {
    match err {
        EngineError::Core(core) => core,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

// =============================================================================
// Balance
// =============================================================================

#[tokio::test]
async fn test_sign_correctness() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 10_000)).await.unwrap();

    record(&engine, &session.id, MovementKind::CashIn, 100).await;
    record(&engine, &session.id, MovementKind::Sale, 500).await;
    record(&engine, &session.id, MovementKind::CashOut, 50).await;
    record(&engine, &session.id, MovementKind::Expense, 20).await;
    record(&engine, &session.id, MovementKind::Refund, 30).await;

    let balance = engine.compute_theoretical_balance(&session.id).await.unwrap();
    assert_eq!(balance, Money::from_cents(10_000 + 500));
}

#[tokio::test]
async fn test_balance_is_deterministic() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 2_500)).await.unwrap();
    record(&engine, &session.id, MovementKind::Sale, 1_234).await;
    record(&engine, &session.id, MovementKind::Refund, 234).await;

    let first = engine.compute_theoretical_balance(&session.id).await.unwrap();
    let second = engine.compute_theoretical_balance(&session.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, Money::from_cents(3_500));
}

#[tokio::test]
async fn test_balance_of_unknown_session() {
    let engine = engine().await;
    let err = core_err(engine.compute_theoretical_balance("missing").await.unwrap_err());
    assert!(matches!(err, CoreError::SessionNotFound { .. }));
}

// =============================================================================
// Open
// =============================================================================

#[tokio::test]
async fn test_duplicate_open_is_rejected() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let first = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();

    let err = core_err(engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap_err());
    match err {
        CoreError::DuplicateOpenSession {
            register_id,
            period_label,
            business_date,
            existing_session_id,
        } => {
            assert_eq!(register_id, reg.id);
            assert_eq!(period_label, "Morning");
            assert_eq!(business_date, first.business_date);
            assert_eq!(existing_session_id, Some(first.id));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_other_period_and_register_may_open() {
    let engine = engine().await;
    let r1 = add_register(&engine, "R1").await;
    let r2 = add_register(&engine, "R2").await;

    engine.open(open_request(&r1.id, "Morning", 0)).await.unwrap();
    engine.open(open_request(&r1.id, "Evening", 0)).await.unwrap();
    engine.open(open_request(&r2.id, "Morning", 0)).await.unwrap();

    assert_eq!(engine.list_open_sessions(None).await.unwrap().len(), 3);
    assert_eq!(engine.list_open_sessions(Some(&r1.id)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_open_after_close_is_allowed() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let first = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();
    engine.close(close_request(&first.id, 0, false)).await.unwrap();

    let second = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_open_preconditions() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;

    let err = core_err(engine.open(open_request(&reg.id, "Morning", -1)).await.unwrap_err());
    assert!(matches!(err, CoreError::InvalidAmount { amount_cents: -1, .. }));

    let err = core_err(engine.open(open_request(&reg.id, "  ", 0)).await.unwrap_err());
    assert!(matches!(err, CoreError::Validation(_)));

    let err = core_err(engine.open(open_request("ghost", "Morning", 0)).await.unwrap_err());
    assert!(matches!(err, CoreError::RegisterNotFound { .. }));

    engine.database().registers().set_active(&reg.id, false).await.unwrap();
    let err = core_err(engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap_err());
    assert!(matches!(err, CoreError::RegisterInactive { ref register_id } if *register_id == reg.id));

    assert!(engine.list_open_sessions(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_amounts_above_ceiling_are_rejected() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;

    let err = core_err(engine.open(open_request(&reg.id, "Morning", i64::MAX)).await.unwrap_err());
    assert!(matches!(err, CoreError::InvalidAmount { amount_cents: i64::MAX, .. }));

    let session = engine
        .open(open_request(&reg.id, "Morning", MAX_AMOUNT_CENTS))
        .await
        .unwrap();
    record(&engine, &session.id, MovementKind::Sale, MAX_AMOUNT_CENTS).await;

    let err = engine
        .record_movement(
            &session.id,
            NewMovement::new(MovementKind::Sale, Money::from_cents(MAX_AMOUNT_CENTS + 1), ""),
        )
        .await
        .unwrap_err();
    assert!(matches!(core_err(err), CoreError::InvalidAmount { .. }));

    let balance = engine.compute_theoretical_balance(&session.id).await.unwrap();
    assert_eq!(balance, Money::from_cents(2 * MAX_AMOUNT_CENTS));

    let err = core_err(engine.close(close_request(&session.id, i64::MAX, false)).await.unwrap_err());
    assert!(matches!(err, CoreError::InvalidAmount { .. }));
    assert!(engine.get_session(&session.id).await.unwrap().is_open());

    let report = engine
        .close(close_request(&session.id, MAX_AMOUNT_CENTS, false))
        .await
        .unwrap();
    assert_eq!(report.figures.variance, Money::from_cents(-MAX_AMOUNT_CENTS));
}

#[tokio::test]
async fn test_open_stamps_business_date() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let before = engine.config().business_date(Utc::now());
    let session = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();
    let after = engine.config().business_date(Utc::now());

    assert!(session.business_date == before || session.business_date == after);
    let listed = engine.sessions_for_date(session.business_date).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, session.id);
}

// =============================================================================
// Record
// =============================================================================

#[tokio::test]
async fn test_record_rejects_non_positive_amounts() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();

    for cents in [0, -100] {
        let movement = NewMovement::new(MovementKind::Sale, Money::from_cents(cents), "");
        let err = core_err(engine.record_movement(&session.id, movement).await.unwrap_err());
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }
    assert!(engine.list_movements(&session.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_record_against_missing_session() {
    let engine = engine().await;
    let movement = NewMovement::new(MovementKind::CashIn, Money::from_cents(100), "");
    let err = core_err(engine.record_movement("missing", movement).await.unwrap_err());
    assert!(matches!(err, CoreError::SessionNotOpen { .. }));
}

#[tokio::test]
async fn test_movement_keeps_reference() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();

    let movement = NewMovement::new(MovementKind::Refund, Money::from_cents(30), "returned box")
        .with_reference("INV-0042");
    let recorded = engine.record_movement(&session.id, movement).await.unwrap();

    assert_eq!(recorded.reference.as_deref(), Some("INV-0042"));
    assert_eq!(recorded.contribution(), Money::from_cents(-30));
}

// =============================================================================
// Close
// =============================================================================

#[tokio::test]
async fn test_closed_session_is_immutable() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 1_000)).await.unwrap();
    record(&engine, &session.id, MovementKind::Sale, 200).await;
    engine.close(close_request(&session.id, 1_200, false)).await.unwrap();

    let movement = NewMovement::new(MovementKind::Sale, Money::from_cents(1), "late");
    let err = core_err(engine.record_movement(&session.id, movement).await.unwrap_err());
    assert!(matches!(err, CoreError::SessionNotOpen { .. }));

    // A row slipped in underneath the engine does not move the frozen figure.
    sqlx::query(
        r#"
        INSERT INTO cash_movements (id, session_id, kind, amount_cents, description, recorded_at)
        VALUES ('sneaky', ?1, 'sale', 999, '', ?2)
        "#,
    )
    .bind(&session.id)
    .bind(Utc::now())
    .execute(engine.database().pool())
    .await
    .unwrap();

    let balance = engine.compute_theoretical_balance(&session.id).await.unwrap();
    assert_eq!(balance, Money::from_cents(1_200));

    let err = core_err(engine.close(close_request(&session.id, 0, false)).await.unwrap_err());
    assert!(matches!(err, CoreError::SessionNotOpen { .. }));
}

#[tokio::test]
async fn test_variance_arithmetic() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;

    let short = engine.open(open_request(&reg.id, "Morning", 1_000)).await.unwrap();
    let report = engine.close(close_request(&short.id, 950, false)).await.unwrap();
    assert_eq!(report.figures.theoretical, Money::from_cents(1_000));
    assert_eq!(report.figures.variance, Money::from_cents(-50));
    assert_eq!(report.session.variance_cents, Some(-50));

    let exact = engine.open(open_request(&reg.id, "Evening", 1_000)).await.unwrap();
    let report = engine.close(close_request(&exact.id, 1_000, false)).await.unwrap();
    assert!(report.figures.variance.is_zero());
}

#[tokio::test]
async fn test_negative_count_rejected() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();

    let err = core_err(engine.close(close_request(&session.id, -1, false)).await.unwrap_err());
    assert!(matches!(err, CoreError::InvalidAmount { .. }));
    assert!(engine.get_session(&session.id).await.unwrap().is_open());
}

#[tokio::test]
async fn test_close_missing_session() {
    let engine = engine().await;
    let err = core_err(engine.close(close_request("missing", 0, false)).await.unwrap_err());
    assert!(matches!(err, CoreError::SessionNotOpen { .. }));
}

#[tokio::test]
async fn test_pending_settlement_gate() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();
    let sale = engine
        .database()
        .pending_sales()
        .record(&session.id, "INV-0042", Money::from_cents(75), SettlementStatus::Pending)
        .await
        .unwrap();

    let err = engine.close(close_request(&session.id, 0, false)).await.unwrap_err();
    assert!(err.is_recoverable());
    match core_err(err) {
        CoreError::PendingSettlementsExist { session_id, sales } => {
            assert_eq!(session_id, session.id);
            assert_eq!(sales, vec![sale.clone()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(engine.get_session(&session.id).await.unwrap().is_open());

    let report = engine.close(close_request(&session.id, 0, true)).await.unwrap();
    assert_eq!(report.session.status, SessionState::Closed);
    assert!(report.session.force_closed);
    assert_eq!(report.session.unsettled_at_close, 1);
    assert_eq!(report.overridden_sales, vec![sale]);

    let stored = engine.get_session(&session.id).await.unwrap();
    assert!(stored.force_closed);
    assert_eq!(stored.unsettled_at_close, 1);
}

#[tokio::test]
async fn test_settled_sales_do_not_block() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();
    let sales = engine.database().pending_sales();
    let sale = sales
        .record(&session.id, "INV-1", Money::from_cents(75), SettlementStatus::PartiallyPaid)
        .await
        .unwrap();
    sales.mark_settled(&sale.id).await.unwrap();

    assert!(engine.unsettled_sales(&session.id).await.unwrap().is_empty());
    let report = engine.close(close_request(&session.id, 0, false)).await.unwrap();
    assert!(!report.session.force_closed);
    assert!(report.overridden_sales.is_empty());
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let engine = engine().await;
    let r1 = add_register(&engine, "R1").await;

    let session = engine.open(open_request(&r1.id, "Morning", 50_000)).await.unwrap();
    record(&engine, &session.id, MovementKind::Sale, 12_000).await;
    record(&engine, &session.id, MovementKind::CashOut, 2_000).await;
    record(&engine, &session.id, MovementKind::Expense, 500).await;

    let report = engine.close(close_request(&session.id, 59_500, false)).await.unwrap();

    assert_eq!(report.figures.theoretical, Money::from_cents(59_500));
    assert!(report.figures.variance.is_zero());
    assert_eq!(report.session.status, SessionState::Closed);

    let stored = engine.get_session(&session.id).await.unwrap();
    assert_eq!(stored.status, SessionState::Closed);
    assert_eq!(stored.theoretical_closing_cents, Some(59_500));
    assert_eq!(stored.counted_closing_cents, Some(59_500));
    assert_eq!(stored.variance_cents, Some(0));
    assert!(stored.closed_at.is_some());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["session"]["status"], "closed");
    assert_eq!(json["figures"]["theoretical"], 59_500);
    assert_eq!(json["figures"]["variance"], 0);
    assert_eq!(json["overridden_sales"], serde_json::json!([]));
}

// =============================================================================
// Read Model and Outbox
// =============================================================================

#[tokio::test]
async fn test_session_report_totals() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 1_000)).await.unwrap();
    record(&engine, &session.id, MovementKind::Sale, 500).await;
    record(&engine, &session.id, MovementKind::Sale, 250).await;
    record(&engine, &session.id, MovementKind::Expense, 20).await;

    let report = engine.session_report(&session.id).await.unwrap();
    assert_eq!(report.movements.len(), 3);
    assert_eq!(report.totals.sales_cents, 750);
    assert_eq!(report.totals.expenses_cents, 20);
    assert_eq!(report.totals.movement_count, 3);
    assert_eq!(
        report.session.opening_float() + report.totals.net(),
        engine.compute_theoretical_balance(&session.id).await.unwrap()
    );

    let err = core_err(engine.session_report("missing").await.unwrap_err());
    assert!(matches!(err, CoreError::SessionNotFound { .. }));
}

#[tokio::test]
async fn test_close_queues_frozen_totals() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 50_000)).await.unwrap();
    record(&engine, &session.id, MovementKind::Sale, 12_000).await;
    record(&engine, &session.id, MovementKind::Refund, 1_000).await;

    let outbox = engine.database().posting_outbox();
    assert_eq!(outbox.count_pending().await.unwrap(), 0);

    engine.close(close_request(&session.id, 60_500, false)).await.unwrap();

    let pending = outbox.list_pending(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    let totals = pending[0].totals().unwrap();
    assert_eq!(totals.session_id, session.id);
    assert_eq!(totals.register_id, reg.id);
    assert_eq!(totals.business_date, session.business_date);
    assert_eq!(totals.totals.sales_cents, 12_000);
    assert_eq!(totals.totals.refunds_cents, 1_000);
    assert_eq!(totals.theoretical_closing_cents, 61_000);
    assert_eq!(totals.counted_closing_cents, 60_500);
    assert_eq!(totals.variance_cents, -500);
    assert!(!totals.force_closed);

    outbox.mark_posted(&pending[0].id).await.unwrap();
    assert_eq!(outbox.count_pending().await.unwrap(), 0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_opens_admit_one() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;

    let (a, b) = tokio::join!(
        engine.open(open_request(&reg.id, "Morning", 0)),
        engine.open(open_request(&reg.id, "Morning", 0)),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let failure = results.into_iter().find_map(Result::err).unwrap();
    assert!(matches!(core_err(failure), CoreError::DuplicateOpenSession { .. }));
    assert_eq!(engine.list_open_sessions(Some(&reg.id)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_closes_admit_one() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 1_000)).await.unwrap();

    let (a, b) = tokio::join!(
        engine.close(close_request(&session.id, 1_000, false)),
        engine.close(close_request(&session.id, 7, false)),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let failure = results.into_iter().find_map(Result::err).unwrap();
    assert!(matches!(core_err(failure), CoreError::SessionNotOpen { .. }));
    assert_eq!(engine.database().posting_outbox().count_pending().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_movements_all_land() {
    let engine = engine().await;
    let reg = add_register(&engine, "R1").await;
    let session = engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap();

    let sale = || NewMovement::new(MovementKind::Sale, Money::from_cents(100), "");
    let (a, b, c, d) = tokio::join!(
        engine.record_movement(&session.id, sale()),
        engine.record_movement(&session.id, sale()),
        engine.record_movement(&session.id, sale()),
        engine.record_movement(&session.id, NewMovement::new(MovementKind::CashOut, Money::from_cents(50), "")),
    );
    for result in [a, b, c, d] {
        result.unwrap();
    }

    let balance = engine.compute_theoretical_balance(&session.id).await.unwrap();
    assert_eq!(balance, Money::from_cents(250));
}

#[tokio::test]
async fn test_concurrent_opens_on_pooled_file_database() {
    let path = std::env::temp_dir().join(format!("drawer-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path).max_connections(4))
        .await
        .unwrap();
    let engine = SessionEngine::new(db.clone(), EngineConfig::default());
    let reg = add_register(&engine, "R1").await;

    let (a, b, c) = tokio::join!(
        engine.open(open_request(&reg.id, "Morning", 0)),
        engine.open(open_request(&reg.id, "Morning", 0)),
        engine.open(open_request(&reg.id, "Morning", 0)),
    );
    let opened = [a, b, c].into_iter().filter(Result::is_ok).count();
    let still_open = engine.list_open_sessions(Some(&reg.id)).await.unwrap().len();

    db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }

    assert_eq!(opened, 1);
    assert_eq!(still_open, 1);
}

// =============================================================================
// Collaborator Seams
// =============================================================================

struct LockedDirectory;

impl RegisterDirectory for LockedDirectory {
    async fn get_register(&self, register_id: &str) -> EngineResult<Option<RegisterStatus>> {
        Ok(Some(RegisterStatus {
            id: register_id.to_string(),
            active: false,
        }))
    }
}

#[tokio::test]
async fn test_custom_directory_is_consulted() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let reg = db.registers().create("R1", "Front", None).await.unwrap();
    let engine = SessionEngine::with_collaborators(
        db.clone(),
        LockedDirectory,
        db.pending_sales(),
        EngineConfig::default(),
    );

    let err = core_err(engine.open(open_request(&reg.id, "Morning", 0)).await.unwrap_err());
    assert!(matches!(err, CoreError::RegisterInactive { .. }));
}

// crates/backend-lib/tests/transactions.rs
//
// Unit-of-work lifecycle and audit atomicity.

mod common;

use axum::http::Method;
use chrono::Utc;
use opsgate_backend_lib::{
    audit::{self, AuditRecord, AuditRecorder},
    db::UnitOfWorkState,
    error::AppError,
    principal::{Principal, PrincipalStore, SqlitePrincipalStore},
    trace::TraceId,
};
use opsgate_common::AuditOutcome;

fn sample_principal(username: &str) -> Principal {
    Principal {
        username: username.to_string(),
        credential_hash: "$scrypt$ln=8,r=8,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".to_string(),
        credential_history: Vec::new(),
        updated_at: Utc::now(),
    }
}

async fn audit_rows(db: &opsgate_backend_lib::db::Database) -> Vec<AuditRecord> {
    sqlx::query_as::<_, AuditRecord>(
        "SELECT trace_id, method, path, entity_type, outcome, actor, created_at FROM audit_log",
    )
    .fetch_all(db.pool())
    .await
    .unwrap()
}

#[tokio::test]
async fn mutation_and_audit_record_commit_together() {
    let (db, _settings, _dir) = common::test_db().await;
    let store = SqlitePrincipalStore;
    let ctx = common::request_ctx(Method::POST, "/principals");

    audit::audited(&db, &ctx, "principal", |mut uow| async move {
        store.insert(&mut uow, &sample_principal("alice")).await?;
        Ok((uow, ()))
    })
    .await
    .unwrap();

    let fetched = store.fetch(&db, "alice").await.unwrap();
    assert!(fetched.is_some());

    let rows = audit_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].trace_id.len(), TraceId::LEN);
    assert_eq!(rows[0].method, "POST");
    assert_eq!(rows[0].path, "/principals");
    assert_eq!(rows[0].entity_type, "principal");
    assert_eq!(rows[0].outcome, "success");
    assert_eq!(rows[0].actor.as_deref(), Some("test-admin"));
}

#[tokio::test]
async fn audit_write_failure_rolls_back_the_business_write() {
    let (db, _settings, _dir) = common::test_db().await;
    let store = SqlitePrincipalStore;
    let ctx = common::request_ctx(Method::POST, "/principals");

    // sabotage the ledger so the audit insert must fail
    sqlx::query("DROP TABLE audit_log")
        .execute(db.pool())
        .await
        .unwrap();

    let result = audit::audited(&db, &ctx, "principal", |mut uow| async move {
        store.insert(&mut uow, &sample_principal("bob")).await?;
        Ok((uow, ()))
    })
    .await;

    assert!(matches!(result, Err(AppError::AuditWrite(_))));
    // the business row must not have survived either
    assert!(store.fetch(&db, "bob").await.unwrap().is_none());
}

#[tokio::test]
async fn business_failure_leaves_no_audit_record() {
    let (db, _settings, _dir) = common::test_db().await;
    let store = SqlitePrincipalStore;
    let ctx = common::request_ctx(Method::POST, "/principals");

    let result = audit::audited(&db, &ctx, "principal", |mut uow| async move {
        store.insert(&mut uow, &sample_principal("carol")).await?;
        // duplicate insert violates the primary key
        store.insert(&mut uow, &sample_principal("carol")).await?;
        Ok((uow, ()))
    })
    .await;

    assert!(matches!(result, Err(AppError::PrincipalExists)));
    assert!(store.fetch(&db, "carol").await.unwrap().is_none());
    assert!(audit_rows(&db).await.is_empty());
}

#[tokio::test]
async fn dropping_an_active_unit_of_work_rolls_back() {
    let (db, _settings, _dir) = common::test_db().await;
    let store = SqlitePrincipalStore;

    {
        let mut uow = db.begin().await.unwrap();
        store.insert(&mut uow, &sample_principal("dave")).await.unwrap();
        // abandoned (cancellation, deadline, unwind): no commit
    }

    assert!(store.fetch(&db, "dave").await.unwrap().is_none());
}

#[tokio::test]
async fn unit_of_work_state_machine() {
    let (db, _settings, _dir) = common::test_db().await;

    let mut uow = db.begin().await.unwrap();
    assert_eq!(uow.state(), UnitOfWorkState::Active);
    uow.commit().await.unwrap();
    assert_eq!(uow.state(), UnitOfWorkState::Committed);
    // terminal: no further statements, no second finish
    assert!(uow.conn().is_err());
    assert!(uow.commit().await.is_err());

    let mut uow = db.begin().await.unwrap();
    uow.rollback().await.unwrap();
    assert_eq!(uow.state(), UnitOfWorkState::RolledBack);
    assert!(uow.conn().is_err());
}

#[tokio::test]
async fn rejection_is_recorded_in_its_own_unit_of_work() {
    let (db, _settings, _dir) = common::test_db().await;
    let ctx = common::request_ctx(Method::PUT, "/principals/alice/password");

    audit::record_rejection(&db, &ctx, "credential").await.unwrap();

    let rows = audit_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].outcome, AuditOutcome::Rejected.as_str());
    assert_eq!(rows[0].entity_type, "credential");
}

#[tokio::test]
async fn record_carries_the_sentinel_when_no_trace_is_bound() {
    let (db, _settings, _dir) = common::test_db().await;
    let ctx = opsgate_backend_lib::trace::RequestContext::unbound(
        &Method::POST,
        "/principals",
    );

    let mut uow = db.begin().await.unwrap();
    AuditRecorder::record(&mut uow, &ctx, "principal", AuditOutcome::Success)
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let rows = audit_rows(&db).await;
    assert_eq!(rows[0].trace_id, "-");
}

// ============================
// opsgate-backend-lib/src/audit.rs
// ============================
//! Audit ledger.
//!
//! One record per mutating request, written inside the same unit of work as
//! the business change it describes: if that unit rolls back, the record
//! goes with it, and if the record cannot be written, the change must not
//! commit either.
use std::future::Future;

use chrono::{DateTime, Utc};
use metrics::counter;
use opsgate_common::AuditOutcome;
use serde::Serialize;

use crate::db::{Database, UnitOfWork};
use crate::error::AppError;
use crate::metrics::AUDIT_RECORDED;
use crate::trace::RequestContext;

/// One immutable row of the append-only audit ledger.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditRecord {
    pub trace_id: String,
    pub method: String,
    pub path: String,
    pub entity_type: String,
    pub outcome: String,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct AuditRecorder;

impl AuditRecorder {
    /// Insert one audit row inside the caller's active unit of work.
    ///
    /// The row carries the trace id bound to the request (or the sentinel),
    /// so the ledger entry correlates with every log line of the request.
    pub async fn record(
        uow: &mut UnitOfWork,
        ctx: &RequestContext,
        entity_type: &str,
        outcome: AuditOutcome,
    ) -> Result<(), AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO audit_log (trace_id, method, path, entity_type, outcome, actor, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(ctx.trace_field())
        .bind(&ctx.method)
        .bind(&ctx.path)
        .bind(entity_type)
        .bind(outcome.as_str())
        .bind(ctx.actor.as_deref())
        .bind(Utc::now())
        .execute(uow.conn()?)
        .await;

        match inserted {
            Ok(_) => {
                counter!(AUDIT_RECORDED).increment(1);
                Ok(())
            },
            Err(e) => Err(AppError::AuditWrite(e)),
        }
    }
}

/// Run a mutating operation inside an audited unit of work.
///
/// Opens a unit of work, hands it to `op`, records exactly one audit row for
/// the mutation, then commits. Any failure along the way (business write,
/// audit write, commit) rolls the whole unit back and is logged with the
/// bound trace id; the audit row and the mutation are durable together or
/// not at all.
pub async fn audited<T, F, Fut>(
    db: &Database,
    ctx: &RequestContext,
    entity_type: &str,
    op: F,
) -> Result<T, AppError>
where
    F: FnOnce(UnitOfWork) -> Fut,
    Fut: Future<Output = Result<(UnitOfWork, T), AppError>>,
{
    let result: Result<T, AppError> = async {
        let uow = db.begin().await?;
        // `op` owns the unit of work; an early return drops it, which rolls back
        let (mut uow, value) = op(uow).await?;
        AuditRecorder::record(&mut uow, ctx, entity_type, AuditOutcome::Success).await?;
        uow.commit().await?;
        Ok(value)
    }
    .await;

    if let Err(e) = &result {
        if !e.is_validation() {
            tracing::error!(
                trace_id = %ctx.trace_field(),
                entity_type,
                error = %e,
                "audited unit of work rolled back"
            );
        }
    }

    result
}

/// Record a rejected mutation attempt in its own committed unit of work.
///
/// Rejections change nothing, so there is no business transaction to join;
/// the ledger still gets one row saying the attempt happened and was turned
/// away. A failure to write it is surfaced, not swallowed.
pub async fn record_rejection(
    db: &Database,
    ctx: &RequestContext,
    entity_type: &str,
) -> Result<(), AppError> {
    let mut uow = db.begin().await?;
    AuditRecorder::record(&mut uow, ctx, entity_type, AuditOutcome::Rejected).await?;
    uow.commit().await
}

// ============================
// opsgate-backend-lib/src/db.rs
// ============================
//! Connection pool and unit-of-work lifecycle.
//!
//! [`Database`] is constructed once on startup and passed by handle; it is
//! the only shared mutable resource in the core. [`UnitOfWork`] is a scoped
//! transaction: commit on the success path, rollback on every other exit
//! path, release back to the pool always.
use std::str::FromStr;
use std::time::Duration;

use metrics::counter;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::config::Settings;
use crate::error::AppError;
use crate::metrics::{UOW_COMMITTED, UOW_ROLLED_BACK};

/// Owns the connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Build the pool from settings.
    ///
    /// The cap is steady-state size plus overflow allowance; connections are
    /// health-checked before reuse and recycled after `recycle_secs` so
    /// long-lived idle connections cannot go stale.
    pub async fn connect(settings: &Settings) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&settings.database_url)
            .map_err(AppError::Database)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.pool.size + settings.pool.max_overflow)
            .acquire_timeout(Duration::from_secs(settings.pool.acquire_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(settings.pool.idle_timeout_secs)))
            .max_lifetime(Some(Duration::from_secs(settings.pool.recycle_secs)))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS principals (
                username           TEXT PRIMARY KEY,
                credential_hash    TEXT NOT NULL,
                credential_history TEXT NOT NULL DEFAULT '[]',
                updated_at         TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Append-only ledger: the application exposes no update/delete path.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                trace_id    TEXT NOT NULL,
                method      TEXT NOT NULL,
                path        TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                outcome     TEXT NOT NULL,
                actor       TEXT,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Open a new unit of work.
    pub async fn begin(&self) -> Result<UnitOfWork, AppError> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork::new(tx))
    }

    /// Direct pool access for transaction-free reads.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial statement to check pool health.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Dispose of the pool on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Lifecycle of a [`UnitOfWork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOfWorkState {
    Active,
    Committed,
    RolledBack,
}

/// A scoped database transaction.
///
/// All statements issued through [`UnitOfWork::conn`] observe the same
/// transaction. Dropping an active unit rolls it back and returns the
/// connection to the pool, so abandonment (cancellation, deadline, panic
/// unwind) can never leak a connection or leave partial writes.
pub struct UnitOfWork {
    tx: Option<Transaction<'static, Sqlite>>,
    state: UnitOfWorkState,
}

impl UnitOfWork {
    fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self {
            tx: Some(tx),
            state: UnitOfWorkState::Active,
        }
    }

    pub fn state(&self) -> UnitOfWorkState {
        self.state
    }

    /// The transaction's connection, for issuing statements.
    pub fn conn(&mut self) -> Result<&mut SqliteConnection, AppError> {
        match self.tx.as_deref_mut() {
            Some(conn) => Ok(conn),
            None => Err(AppError::Internal(
                "unit of work is no longer active".to_string(),
            )),
        }
    }

    /// Commit. Only reachable from `Active`.
    pub async fn commit(&mut self) -> Result<(), AppError> {
        match self.tx.take() {
            Some(tx) => {
                tx.commit().await?;
                self.state = UnitOfWorkState::Committed;
                counter!(UOW_COMMITTED).increment(1);
                Ok(())
            },
            None => Err(AppError::Internal(
                "unit of work already finished".to_string(),
            )),
        }
    }

    /// Roll back explicitly. Dropping an active unit has the same effect.
    pub async fn rollback(&mut self) -> Result<(), AppError> {
        match self.tx.take() {
            Some(tx) => {
                tx.rollback().await?;
                self.state = UnitOfWorkState::RolledBack;
                counter!(UOW_ROLLED_BACK).increment(1);
                Ok(())
            },
            None => Err(AppError::Internal(
                "unit of work already finished".to_string(),
            )),
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.state == UnitOfWorkState::Active && self.tx.is_some() {
            // the inner transaction's drop queues the actual rollback
            self.state = UnitOfWorkState::RolledBack;
            counter!(UOW_ROLLED_BACK).increment(1);
            tracing::debug!("unit of work dropped while active; rolling back");
        }
    }
}

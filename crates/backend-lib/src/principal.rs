// ============================
// opsgate-backend-lib/src/principal.rs
// ============================
//! Principal persistence.
//!
//! The credential history column is a JSON array of retired hashes, ordered
//! oldest-first and pruned to the retained window on every write.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;

use crate::db::{Database, UnitOfWork};
use crate::error::AppError;

/// An administrative principal and its credential state.
///
/// The clear-text credential never appears here; only its hash is stored.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub username: String,
    pub credential_hash: String,
    /// Retired hashes, oldest first, at most the retained window
    pub credential_history: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Trait for principal storage backends
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Fetch a principal by username (transaction-free pool read)
    async fn fetch(&self, db: &Database, username: &str) -> Result<Option<Principal>, AppError>;

    /// Insert a new principal inside the caller's unit of work
    async fn insert(&self, uow: &mut UnitOfWork, principal: &Principal) -> Result<(), AppError>;

    /// Replace a principal's credential hash and history inside the caller's
    /// unit of work.
    ///
    /// The write is conditional on `expected_hash` still being the stored
    /// hash, so two rotations racing from the same fetched snapshot cannot
    /// silently overwrite each other: the loser gets
    /// [`AppError::RotationConflict`] instead of success.
    async fn update_credential(
        &self,
        uow: &mut UnitOfWork,
        username: &str,
        credential_hash: &str,
        credential_history: &[String],
        expected_hash: &str,
    ) -> Result<(), AppError>;
}

/// SQLite implementation of the `PrincipalStore` trait
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlitePrincipalStore;

#[async_trait]
impl PrincipalStore for SqlitePrincipalStore {
    async fn fetch(&self, db: &Database, username: &str) -> Result<Option<Principal>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT username, credential_hash, credential_history, updated_at
            FROM principals
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(db.pool())
        .await?;

        match row {
            Some(row) => {
                let history_json: String = row.try_get("credential_history")?;
                let credential_history: Vec<String> = serde_json::from_str(&history_json)?;
                Ok(Some(Principal {
                    username: row.try_get("username")?,
                    credential_hash: row.try_get("credential_hash")?,
                    credential_history,
                    updated_at: row.try_get("updated_at")?,
                }))
            },
            None => Ok(None),
        }
    }

    async fn insert(&self, uow: &mut UnitOfWork, principal: &Principal) -> Result<(), AppError> {
        let history_json = serde_json::to_string(&principal.credential_history)?;

        let result = sqlx::query(
            r#"
            INSERT INTO principals (username, credential_hash, credential_history, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&principal.username)
        .bind(&principal.credential_hash)
        .bind(history_json)
        .bind(principal.updated_at)
        .execute(uow.conn()?)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::PrincipalExists)
            },
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn update_credential(
        &self,
        uow: &mut UnitOfWork,
        username: &str,
        credential_hash: &str,
        credential_history: &[String],
        expected_hash: &str,
    ) -> Result<(), AppError> {
        let history_json = serde_json::to_string(credential_history)?;

        let result = sqlx::query(
            r#"
            UPDATE principals
            SET credential_hash = ?1, credential_history = ?2, updated_at = ?3
            WHERE username = ?4 AND credential_hash = ?5
            "#,
        )
        .bind(credential_hash)
        .bind(history_json)
        .bind(Utc::now())
        .bind(username)
        .bind(expected_hash)
        .execute(uow.conn()?)
        .await?;

        // zero rows: the row vanished or another rotation committed first;
        // either way the caller's snapshot is stale
        if result.rows_affected() == 0 {
            return Err(AppError::RotationConflict);
        }
        Ok(())
    }
}

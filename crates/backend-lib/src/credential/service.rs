// ============================
// opsgate-backend-lib/src/credential/service.rs
// ============================
//! Credential lifecycle operations.
//!
//! Policy checks, the reuse guard and hashing all run before a unit of work
//! is opened. Hashing and hash comparison are CPU-bound and deliberately
//! slow, so they run on the blocking pool and must never hold a pool
//! connection while in progress.
use chrono::Utc;
use metrics::counter;
use zeroize::Zeroize;

use crate::audit;
use crate::credential::hasher::CredentialHasher;
use crate::credential::{history, policy};
use crate::db::Database;
use crate::error::AppError;
use crate::metrics::{CREDENTIAL_ROTATED, POLICY_REJECTED, REUSE_REJECTED};
use crate::principal::{Principal, PrincipalStore};
use crate::trace::RequestContext;

/// Create a new principal with an initial credential.
pub async fn create_principal<S: PrincipalStore>(
    db: &Database,
    store: &S,
    hasher: &CredentialHasher,
    ctx: &RequestContext,
    username: &str,
    password: String,
) -> Result<(), AppError> {
    let unmet = policy::violations(&password);
    if !unmet.is_empty() {
        counter!(POLICY_REJECTED).increment(1);
        audit::record_rejection(db, ctx, "principal").await?;
        return Err(AppError::PolicyRejected(unmet));
    }

    let credential_hash = hash_off_thread(*hasher, password).await?;

    let principal = Principal {
        username: username.to_string(),
        credential_hash,
        credential_history: Vec::new(),
        updated_at: Utc::now(),
    };

    audit::audited(db, ctx, "principal", |mut uow| async move {
        store.insert(&mut uow, &principal).await?;
        Ok((uow, ()))
    })
    .await?;

    tracing::info!(trace_id = %ctx.trace_field(), username, "principal created");
    Ok(())
}

/// Rotate a principal's password.
///
/// The candidate is checked against the current hash plus the retired
/// history (the current hash is always the newest compared entry), the
/// outgoing hash is retired into the bounded history, and the row update
/// commits atomically with its audit record. The update compares-and-sets
/// on the fetched hash, so a rotation racing another one surfaces as a
/// conflict instead of overwriting the winner's retired history.
pub async fn change_password<S: PrincipalStore>(
    db: &Database,
    store: &S,
    hasher: &CredentialHasher,
    ctx: &RequestContext,
    username: &str,
    new_password: String,
) -> Result<(), AppError> {
    let unmet = policy::violations(&new_password);
    if !unmet.is_empty() {
        counter!(POLICY_REJECTED).increment(1);
        audit::record_rejection(db, ctx, "credential").await?;
        return Err(AppError::PolicyRejected(unmet));
    }

    let principal = store
        .fetch(db, username)
        .await?
        .ok_or(AppError::PrincipalNotFound)?;

    // retired hashes plus the current one, newest last
    let mut recent = principal.credential_history.clone();
    recent.push(principal.credential_hash.clone());

    let new_hash = match guard_and_hash(*hasher, new_password, recent).await? {
        Some(hash) => hash,
        None => {
            counter!(REUSE_REJECTED).increment(1);
            audit::record_rejection(db, ctx, "credential").await?;
            return Err(AppError::PasswordReused);
        },
    };

    // the commit is conditional on this snapshot still being current
    let expected_hash = principal.credential_hash.clone();
    let mut credential_history = principal.credential_history;
    history::retire(&mut credential_history, principal.credential_hash);

    audit::audited(db, ctx, "credential", |mut uow| async move {
        store
            .update_credential(&mut uow, username, &new_hash, &credential_history, &expected_hash)
            .await?;
        Ok((uow, ()))
    })
    .await?;

    counter!(CREDENTIAL_ROTATED).increment(1);
    tracing::info!(trace_id = %ctx.trace_field(), username, "credential rotated");
    Ok(())
}

/// Hash a candidate on the blocking pool, zeroizing the plaintext.
async fn hash_off_thread(
    hasher: CredentialHasher,
    mut password: String,
) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hasher.hash_secure(&mut password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
}

/// Run the reuse guard and, if the candidate is fresh, hash it.
///
/// Both steps are scrypt-bound, so they share one blocking-pool hop.
/// Returns `None` when the candidate matches a recent hash.
async fn guard_and_hash(
    hasher: CredentialHasher,
    mut password: String,
    recent: Vec<String>,
) -> Result<Option<String>, AppError> {
    tokio::task::spawn_blocking(move || {
        if history::was_used_recently(&hasher, &password, &recent) {
            password.zeroize();
            return Ok(None);
        }
        hasher.hash_secure(&mut password).map(Some)
    })
    .await
    .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
}

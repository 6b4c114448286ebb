// ============================
// opsgate-backend-lib/src/lib.rs
// ============================
//! Credential-security and audit-correlation core of the `Opsgate` admin
//! backend: password policy and hashing, reuse guard, trace correlation,
//! and the audited unit-of-work discipline tying every mutation to exactly
//! one durable audit record.

pub mod config;
pub mod error;
pub mod metrics;
pub mod trace;
pub mod credential;
pub mod db;
pub mod audit;
pub mod principal;
pub mod middleware;
pub mod router;

use std::sync::Arc;

use crate::config::Settings;
use crate::credential::CredentialHasher;
use crate::db::Database;
use crate::principal::PrincipalStore;
use crate::trace::TraceContext;

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Database handle (pool + unit-of-work factory)
    pub db: Database,
    /// Principal storage backend
    pub store: S,
    /// Credential hasher
    pub hasher: CredentialHasher,
    /// Trace id generator
    pub trace: TraceContext,
    /// Settings
    pub settings: Arc<Settings>,
}

impl<S: PrincipalStore> AppState<S> {
    /// Create a new application state
    pub fn new(db: Database, store: S, settings: Settings) -> Self {
        Self {
            db,
            store,
            hasher: CredentialHasher::new(),
            trace: TraceContext::new(),
            settings: Arc::new(settings),
        }
    }

    /// Swap the default hasher, e.g. for a different work factor
    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }
}

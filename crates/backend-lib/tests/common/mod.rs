// shared scaffolding for the integration tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::http::Method;
use opsgate_backend_lib::{
    config::Settings,
    credential::CredentialHasher,
    db::Database,
    principal::SqlitePrincipalStore,
    trace::{RequestContext, TraceContext},
    AppState,
};

/// Scrypt work factor low enough to keep the suite fast.
pub const TEST_WORK_FACTOR: u8 = 8;

pub fn fast_hasher() -> CredentialHasher {
    CredentialHasher::with_work_factor(TEST_WORK_FACTOR)
}

/// A migrated database backed by a scratch file; the tempdir guard must be
/// kept alive for the duration of the test.
pub async fn test_db() -> (Database, Settings, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.database_url = format!("sqlite://{}", dir.path().join("test.db").display());

    let db = Database::connect(&settings).await.unwrap();
    db.migrate().await.unwrap();
    (db, settings, dir)
}

pub async fn test_state() -> (Arc<AppState<SqlitePrincipalStore>>, tempfile::TempDir) {
    let (db, settings, dir) = test_db().await;
    let state = AppState::new(db, SqlitePrincipalStore, settings).with_hasher(fast_hasher());
    (Arc::new(state), dir)
}

/// A request context with a freshly generated trace id.
pub fn request_ctx(method: Method, path: &str) -> RequestContext {
    let trace = TraceContext::new();
    RequestContext::new(trace.generate(), &method, path)
        .with_actor(Some("test-admin".to_string()))
}

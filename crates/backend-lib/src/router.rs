// ============================
// opsgate-backend-lib/src/router.rs
// ============================
//! HTTP surface of the credential/audit core.
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use opsgate_common::{ChangePasswordRequest, CreatePrincipalRequest, PasswordRequirements};

use crate::credential::{policy, service};
use crate::error::AppError;
use crate::middleware;
use crate::principal::PrincipalStore;
use crate::trace::RequestContext;
use crate::AppState;

/// Create the admin router
pub fn create_router<S: PrincipalStore + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/password-requirements", get(password_requirements))
        .route("/principals", post(create_principal))
        .route("/principals/{username}/password", put(change_password))
        .route("/healthz", get(healthz))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::trace::bind_trace::<S>,
        ))
        .with_state(state)
}

/// Stable policy summary for client-side hinting
async fn password_requirements() -> Json<PasswordRequirements> {
    Json(policy::requirements())
}

async fn create_principal<S: PrincipalStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreatePrincipalRequest>,
) -> Result<StatusCode, AppError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::InvalidInput("username must not be empty".to_string()));
    }

    service::create_principal(
        &state.db,
        &state.store,
        &state.hasher,
        &ctx,
        username,
        req.password,
    )
    .await?;

    Ok(StatusCode::CREATED)
}

async fn change_password<S: PrincipalStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(username): Path<String>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    service::change_password(
        &state.db,
        &state.store,
        &state.hasher,
        &ctx,
        &username,
        req.new_password,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn healthz<S: PrincipalStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<&'static str, AppError> {
    state.db.ping().await?;
    Ok("ok")
}

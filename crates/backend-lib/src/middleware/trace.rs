// ============================
// opsgate-backend-lib/src/middleware/trace.rs
// ============================
//! Trace binding middleware.
//!
//! Runs before dispatch for every inbound request: generates a trace id,
//! builds the request's [`RequestContext`] and stores it in the request
//! extensions, then runs the rest of the pipeline inside a tracing span
//! carrying the id. The context is a per-request value, so concurrent
//! requests on the same worker cannot contaminate each other.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::principal::PrincipalStore;
use crate::trace::RequestContext;
use crate::AppState;

/// Header carrying the acting admin's identity, set by the (out-of-scope)
/// authentication layer in front of this service.
pub const ACTOR_HEADER: &str = "x-admin-actor";

/// Bind a fresh trace id to the request before any business logic runs.
pub async fn bind_trace<S: PrincipalStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let trace_id = state.trace.generate();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let actor = request
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let ctx = RequestContext::new(trace_id, &method, &path).with_actor(actor);

    let span = tracing::info_span!(
        "request",
        trace_id = %ctx.trace_field(),
        method = %ctx.method,
        path = %ctx.path,
    );

    request.extensions_mut().insert(ctx);
    next.run(request).instrument(span).await
}

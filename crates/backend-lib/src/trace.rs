// ============================
// opsgate-backend-lib/src/trace.rs
// ============================
//! Request correlation identifiers.
//!
//! Every inbound request is assigned a [`TraceId`] before any business logic
//! or logging runs, and the id travels through the request as part of an
//! explicit [`RequestContext`] value rather than an ambient task-local, so
//! concurrent requests can never observe each other's binding.
use std::fmt;

use axum::http::Method;
use parking_lot::Mutex;
use ulid::Ulid;

/// Sentinel used in log and audit fields when no trace id is bound.
pub const TRACE_SENTINEL: &str = "-";

/// A ULID: 26 Crockford base32 characters, lexically time-ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraceId(Ulid);

impl TraceId {
    /// Fixed width of the canonical text form.
    pub const LEN: usize = 26;
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Process-wide trace id generator.
///
/// Wraps a monotonic ULID generator so ids handed out by one process compare
/// as non-decreasing under lexical ordering even within a single millisecond.
pub struct TraceContext {
    generator: Mutex<ulid::Generator>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self {
            generator: Mutex::new(ulid::Generator::new()),
        }
    }

    /// Generate the next trace id.
    pub fn generate(&self) -> TraceId {
        let mut generator = self.generator.lock();
        match generator.generate() {
            Ok(ulid) => TraceId(ulid),
            // Random component overflowed within one millisecond; start a
            // fresh sequence rather than failing the request.
            Err(_) => TraceId(Ulid::new()),
        }
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-request context, built by the trace middleware before dispatch and
/// passed explicitly to everything that logs or audits.
#[derive(Debug, Clone)]
pub struct RequestContext {
    trace_id: Option<TraceId>,
    /// HTTP method of the request
    pub method: String,
    /// Target path of the request
    pub path: String,
    /// Actor identity, when the request-handling layer knows it
    pub actor: Option<String>,
    /// Whether this request mutates state (derived from the method)
    pub mutating: bool,
}

impl RequestContext {
    pub fn new(trace_id: TraceId, method: &Method, path: &str) -> Self {
        let mutating = matches!(
            *method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        );
        Self {
            trace_id: Some(trace_id),
            method: method.to_string(),
            path: path.to_string(),
            actor: None,
            mutating,
        }
    }

    /// A context with no bound trace id; log fields fall back to the sentinel.
    pub fn unbound(method: &Method, path: &str) -> Self {
        Self {
            trace_id: None,
            ..Self::new(TraceId(Ulid::nil()), method, path)
        }
    }

    pub fn with_actor(mut self, actor: Option<String>) -> Self {
        self.actor = actor;
        self
    }

    /// The bound trace id, if any.
    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }

    /// Text form for log lines and audit rows: the bound id or `"-"`.
    pub fn trace_field(&self) -> String {
        match self.trace_id {
            Some(id) => id.to_string(),
            None => TRACE_SENTINEL.to_string(),
        }
    }
}

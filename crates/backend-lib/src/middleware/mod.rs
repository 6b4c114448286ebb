// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the `Opsgate` admin backend.

pub mod trace;

pub use trace::bind_trace;

// ============================
// opsgate-backend-lib/src/credential/mod.rs
// ============================
//! Credential security: strength policy, hashing, reuse guard, rotation flow.

pub mod policy;
pub mod hasher;
pub mod history;
pub mod service;

pub use policy::{validate, violations, requirements, RuleViolation, MIN_LENGTH, SPECIAL_CHARS};
pub use hasher::{CredentialHasher, WORK_FACTOR_LOG2};
pub use history::{was_used_recently, retire, HISTORY_WINDOW};

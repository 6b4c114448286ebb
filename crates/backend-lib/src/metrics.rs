// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const AUDIT_RECORDED: &str = "audit.recorded";
pub const UOW_COMMITTED: &str = "uow.committed";
pub const UOW_ROLLED_BACK: &str = "uow.rolled_back";
pub const POLICY_REJECTED: &str = "credential.policy_rejected";
pub const REUSE_REJECTED: &str = "credential.reuse_rejected";
pub const CREDENTIAL_ROTATED: &str = "credential.rotated";

// ================
// common/src/lib.rs
// ================
//! Common types shared between the `Opsgate` admin backend and its clients.
//! These are the request/response shapes of the credential endpoints plus
//! the password-requirements summary used for client-side hinting.

use serde::{Deserialize, Serialize};

/// Displayable summary of the password policy.
///
/// Built by the backend from the same rule constants that drive validation,
/// so it cannot drift out of sync with what the server actually enforces.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PasswordRequirements {
    /// Minimum password length
    pub min_length: usize,
    /// At least one uppercase letter required
    pub require_uppercase: bool,
    /// At least one digit required
    pub require_digit: bool,
    /// At least one character from `special_chars` required
    pub require_special: bool,
    /// The accepted special-character set
    pub special_chars: String,
}

/// Create a new admin principal.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreatePrincipalRequest {
    pub username: String,
    pub password: String,
}

/// Rotate an existing principal's password.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

/// Outcome recorded for an audited administrative operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failed,
}

impl AuditOutcome {
    /// Stable string form as persisted in the audit ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Rejected => "rejected",
            AuditOutcome::Failed => "failed",
        }
    }
}

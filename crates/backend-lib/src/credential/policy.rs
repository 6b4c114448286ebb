// ============================
// opsgate-backend-lib/src/credential/policy.rs
// ============================
//! Password strength policy.
//!
//! Policy-as-code: the rule constants below are the single source of truth,
//! feeding both [`validate`] and the displayable [`requirements`] summary.
//! Nothing here is runtime-configurable.
use opsgate_common::PasswordRequirements;
use serde::Serialize;

/// Minimum password length
pub const MIN_LENGTH: usize = 12;

/// The accepted special-character set
pub const SPECIAL_CHARS: &str = "!@#$%^&*()-_=+[]{};:,.<>?";

/// A strength rule the candidate failed to meet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleViolation {
    TooShort,
    MissingUppercase,
    MissingDigit,
    MissingSpecial,
}

impl RuleViolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleViolation::TooShort => "too_short",
            RuleViolation::MissingUppercase => "missing_uppercase",
            RuleViolation::MissingDigit => "missing_digit",
            RuleViolation::MissingSpecial => "missing_special",
        }
    }
}

/// List every rule the candidate fails, in a stable order.
pub fn violations(candidate: &str) -> Vec<RuleViolation> {
    let mut unmet = Vec::new();

    if candidate.chars().count() < MIN_LENGTH {
        unmet.push(RuleViolation::TooShort);
    }
    if !candidate.chars().any(|c| c.is_uppercase()) {
        unmet.push(RuleViolation::MissingUppercase);
    }
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        unmet.push(RuleViolation::MissingDigit);
    }
    if !candidate.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        unmet.push(RuleViolation::MissingSpecial);
    }

    unmet
}

/// Check if a password meets the strength rules
pub fn validate(candidate: &str) -> bool {
    violations(candidate).is_empty()
}

/// User-displayable summary of the rules, built from the same constants
/// that drive [`validate`].
pub fn requirements() -> PasswordRequirements {
    PasswordRequirements {
        min_length: MIN_LENGTH,
        require_uppercase: true,
        require_digit: true,
        require_special: true,
        special_chars: SPECIAL_CHARS.to_string(),
    }
}

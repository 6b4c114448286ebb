// ============================
// opsgate-backend-lib/src/credential/history.rs
// ============================
//! Password reuse guard.
//!
//! History sequences are ordered oldest-first, newest last. Only the
//! trailing [`HISTORY_WINDOW`] entries are ever compared; callers append the
//! current hash before checking so "same as current" is always caught.
use super::hasher::CredentialHasher;

/// Number of most-recent hashes checked against a candidate.
pub const HISTORY_WINDOW: usize = 3;

/// Check a candidate against the most recently retired hashes.
///
/// Compares only the trailing [`HISTORY_WINDOW`] entries of `history`
/// (newest first) and short-circuits on the first match. Entries that have
/// fallen out of the window are never consulted.
pub fn was_used_recently(
    hasher: &CredentialHasher,
    candidate: &str,
    history: &[String],
) -> bool {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .rev()
        .any(|stored| hasher.verify(candidate, stored))
}

/// Append an outgoing hash to the history and prune entries that have
/// fallen out of the retained window.
pub fn retire(history: &mut Vec<String>, outgoing: String) {
    history.push(outgoing);
    if history.len() > HISTORY_WINDOW {
        let excess = history.len() - HISTORY_WINDOW;
        history.drain(..excess);
    }
}

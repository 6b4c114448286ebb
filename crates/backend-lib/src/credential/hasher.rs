// ============================
// opsgate-backend-lib/src/credential/hasher.rs
// ============================
//! Credential hashing and verification.
//!
//! scrypt in PHC string format. Every hash gets a fresh random salt, so two
//! hashes of the same candidate never match byte-for-byte yet both verify.
//! Hashing is deliberately slow; callers run it on the blocking pool and
//! never while holding a unit of work.
use scrypt::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Params, Scrypt,
};
use zeroize::Zeroize;

use crate::error::AppError;

/// Default work factor (log2 of the scrypt cost parameter N).
/// N = 2^15 lands in the same verification-latency band as bcrypt cost 12.
pub const WORK_FACTOR_LOG2: u8 = 15;

const BLOCK_SIZE: u32 = 8;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

/// One-way credential hasher with an explicit work factor.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    log_n: u8,
}

impl CredentialHasher {
    pub fn new() -> Self {
        Self {
            log_n: WORK_FACTOR_LOG2,
        }
    }

    /// Construct with a non-default work factor. Lower values are only
    /// appropriate for tests.
    pub fn with_work_factor(log_n: u8) -> Self {
        Self { log_n }
    }

    fn params(&self) -> Result<Params, AppError> {
        Params::new(self.log_n, BLOCK_SIZE, PARALLELISM, OUTPUT_LEN)
            .map_err(|e| AppError::Hash(e.to_string()))
    }

    /// Hash a credential, producing a PHC-format string with embedded
    /// algorithm parameters and a fresh random salt.
    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params()?, &salt)
            .map_err(|e| AppError::Hash(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Hash a credential and zeroize the plaintext buffer.
    pub fn hash_secure(&self, plain: &mut String) -> Result<String, AppError> {
        let hash = self.hash(plain)?;
        plain.zeroize();
        Ok(hash)
    }

    /// Verify a candidate against a stored hash.
    ///
    /// Fails closed: a malformed stored hash is "does not match", never a
    /// propagated fault.
    pub fn verify(&self, plain: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed).is_ok()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // fast parameters so the test suite stays quick
    fn fast() -> CredentialHasher {
        CredentialHasher::with_work_factor(8)
    }

    #[test]
    fn round_trip() {
        let hasher = fast();
        let hash = hasher.hash("CorrectHorse1!").unwrap();
        assert!(hasher.verify("CorrectHorse1!", &hash));
        assert!(!hasher.verify("WrongHorse1!", &hash));
    }

    #[test]
    fn same_candidate_hashes_differently_but_both_verify() {
        let hasher = fast();
        let a = hasher.hash("Abcdefgh12$A").unwrap();
        let b = hasher.hash("Abcdefgh12$A").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("Abcdefgh12$A", &a));
        assert!(hasher.verify("Abcdefgh12$A", &b));
    }

    #[test]
    fn malformed_stored_hash_verifies_false_not_panics() {
        let hasher = fast();
        assert!(!hasher.verify("anything", "<not a valid hash string>"));
        assert!(!hasher.verify("anything", ""));
        assert!(!hasher.verify("anything", "$scrypt$garbage"));
    }

    #[test]
    fn hash_secure_zeroizes_the_plaintext() {
        let hasher = fast();
        let mut plain = "Sensitive123!".to_string();
        let hash = hasher.hash_secure(&mut plain).unwrap();
        assert!(plain.is_empty());
        assert!(hasher.verify("Sensitive123!", &hash));
    }

    #[test]
    fn default_work_factor_is_embedded_in_the_hash() {
        let hasher = CredentialHasher::new();
        let hash = hasher.hash("Abcdefgh12$A").unwrap();
        // PHC string carries ln=15, so any verifier honors the work factor
        assert!(hash.contains("ln=15"));
        assert!(hasher.verify("Abcdefgh12$A", &hash));
    }
}

//! bcrypt password hashing and verification.
//!
//! Verification always runs exactly one bcrypt comparison per call. When the account
//! does not exist the comparison runs against a dummy hash of the same cost, so the
//! unknown-user path costs the same as the wrong-password path.

use tokio::task;
use tracing::warn;

use crate::error::{AuthError, AuthResult};

pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

const DUMMY_PASSWORD: &str = "booking-service-dummy-password";

/// Hash a password with a fresh salt.
pub fn hash_password(password: &str, cost: u32) -> AuthResult<String> {
    if password.trim().is_empty() {
        return Err(AuthError::Internal("password must not be empty".to_string()));
    }

    bcrypt::hash(password, cost)
        .map_err(|err| AuthError::Internal(format!("failed to hash password: {err}")))
}

/// Compare a plaintext password with a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(err) => {
            warn!(error = %err, "stored password hash could not be parsed");
            false
        }
    }
}

#[derive(Clone)]
pub struct PasswordVerifier {
    dummy_hash: String,
}

impl PasswordVerifier {
    pub fn new(cost: u32) -> AuthResult<Self> {
        Ok(Self {
            dummy_hash: hash_password(DUMMY_PASSWORD, cost)?,
        })
    }

    /// Verify on the blocking pool. `stored_hash == None` compares against the dummy hash
    /// and always yields `false`.
    pub async fn verify(&self, password: &str, stored_hash: Option<&str>) -> AuthResult<bool> {
        let found = stored_hash.is_some();
        let hash = stored_hash.unwrap_or(&self.dummy_hash).to_owned();
        let password = password.to_owned();

        let matches = task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|err| AuthError::Internal(format!("password verification task failed: {err}")))?;

        Ok(found && matches)
    }
}

impl std::fmt::Debug for PasswordVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COST: u32 = 4;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct-pw", COST).expect("hash");
        assert!(hash.starts_with("$2"));
        assert!(verify_password("correct-pw", &hash));
        assert!(!verify_password("wrong-pw", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("correct-pw", COST).expect("hash");
        let second = hash_password("correct-pw", COST).expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(hash_password("   ", COST).is_err());
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("correct-pw", "plaintext"));
        assert!(!verify_password("", ""));
    }

    #[tokio::test]
    async fn unknown_user_path_returns_false_even_for_dummy_password() {
        let verifier = PasswordVerifier::new(COST).expect("verifier");
        assert!(!verifier.verify(DUMMY_PASSWORD, None).await.expect("verify"));
    }

    #[tokio::test]
    async fn known_user_path_checks_stored_hash() {
        let verifier = PasswordVerifier::new(COST).expect("verifier");
        let hash = hash_password("correct-pw", COST).expect("hash");
        assert!(verifier.verify("correct-pw", Some(&hash)).await.expect("verify"));
        assert!(!verifier.verify("nope", Some(&hash)).await.expect("verify"));
    }
}

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, Validation};
use tracing::{debug, warn};

use crate::claims::{Claims, ClaimsRepr};
use crate::config::JwtConfig;
use crate::credentials::CredentialStore;
use crate::error::{AuthError, AuthResult};
use crate::keys::SigningKeys;
use crate::roles::Role;

/// Identity resolved from a verified token plus a fresh account lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
    /// Role from the account record, not from the token.
    pub role: Option<Role>,
    pub active: bool,
    pub claims: Claims,
}

#[derive(Clone)]
pub struct JwtVerifier {
    keys: Arc<SigningKeys>,
    config: JwtConfig,
    store: Arc<dyn CredentialStore>,
}

impl JwtVerifier {
    pub fn new(keys: Arc<SigningKeys>, config: JwtConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            keys,
            config,
            store,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.leeway = self.config.leeway_seconds;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }

    /// Check signature, algorithm and expiry, then parse claims. No store access.
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        let data = decode::<ClaimsRepr>(token, self.keys.decoding(), &self.validation())?;
        let claims = Claims::try_from(data.claims)?;

        // jsonwebtoken only rejects exp < now; a token is dead from the exp second onwards.
        let cutoff = Utc::now().timestamp() - self.config.leeway_seconds as i64;
        if claims.expires_at.timestamp() <= cutoff {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    /// Full verification: decode, then confirm the subject still exists and is active.
    pub async fn verify(&self, token: &str) -> AuthResult<AuthenticatedUser> {
        let claims = self.decode(token)?;

        let record = self
            .store
            .lookup(&claims.subject)
            .await
            .map_err(|err| match err {
                AuthError::CredentialStoreUnavailable(_) => err,
                other => AuthError::CredentialStoreUnavailable(other.to_string()),
            })?;

        let record = match record {
            Some(record) if record.active => record,
            Some(_) => {
                debug!(username = %claims.subject, "token presented for disabled account");
                return Err(AuthError::AccountInactiveOrMissing);
            }
            None => {
                debug!(username = %claims.subject, "token presented for unknown account");
                return Err(AuthError::AccountInactiveOrMissing);
            }
        };

        if claims.role != record.role {
            warn!(
                username = %record.username,
                token_role = ?claims.role,
                account_role = ?record.role,
                "token role differs from account role; using account role"
            );
        }

        debug!(username = %record.username, "verified access token");
        Ok(AuthenticatedUser {
            username: record.username,
            role: record.role,
            active: record.active,
            claims,
        })
    }
}

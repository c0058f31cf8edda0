use std::sync::Arc;

use tracing::{debug, info};

use crate::credentials::{CredentialRecord, CredentialStore};
use crate::error::{AuthError, AuthResult};
use crate::password::PasswordVerifier;

/// Username/password login. Every rejection is [`AuthError::InvalidCredentials`].
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordVerifier,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>, passwords: PasswordVerifier) -> Self {
        Self { store, passwords }
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<CredentialRecord> {
        let record = self.store.lookup(username).await?;

        // One bcrypt comparison on every path, dummy hash when the user is unknown.
        let matches = self
            .passwords
            .verify(password, record.as_ref().map(|r| r.password_hash.as_str()))
            .await?;

        match record {
            Some(record) if matches && record.active => {
                info!(username = %record.username, "login succeeded");
                Ok(record)
            }
            Some(record) if matches => {
                debug!(username = %record.username, "login refused for disabled account");
                Err(AuthError::InvalidCredentials)
            }
            _ => {
                debug!("login refused");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

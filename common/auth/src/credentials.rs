use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::AuthResult;
use crate::roles::Role;

/// Stored account credentials. Never serialised; `Debug` hides the hash.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub password_hash: String,
    /// `None` when the stored role is not one of [`Role`].
    pub role: Option<Role>,
    pub active: bool,
}

impl CredentialRecord {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            role: Some(role),
            active: true,
        }
    }

    pub fn with_raw_role(mut self, role: &str) -> Self {
        self.role = Role::parse_opt(role);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.active = false;
        self
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("active", &self.active)
            .finish()
    }
}

/// Username-keyed account lookup consumed by the authenticator and the token verifier.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn lookup(&self, username: &str) -> AuthResult<Option<CredentialRecord>>;
}

/// Thread-safe in-process credential store.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    inner: Arc<RwLock<HashMap<String, CredentialRecord>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: CredentialRecord) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(record.username.clone(), record);
    }

    /// Returns `false` when no such user exists.
    pub fn set_active(&self, username: &str, active: bool) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match guard.get_mut(username) {
            Some(record) => {
                record.active = active;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, username: &str) -> Option<CredentialRecord> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(username)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, username: &str) -> AuthResult<Option<CredentialRecord>> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(username).cloned())
    }
}

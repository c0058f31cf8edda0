use async_trait::async_trait;
use common_auth::{AuthError, AuthResult, CredentialRecord, CredentialStore, Role};
use sqlx::{FromRow, PgPool};
use tracing::warn;

#[derive(FromRow)]
struct UserRow {
    username: String,
    hashed_password: String,
    disabled: bool,
    role: Option<String>,
}

impl From<UserRow> for CredentialRecord {
    fn from(row: UserRow) -> Self {
        let role = row.role.as_deref().and_then(Role::parse_opt);
        if role.is_none() {
            warn!(username = %row.username, "stored role is not recognised");
        }
        CredentialRecord {
            username: row.username,
            password_hash: row.hashed_password,
            role,
            active: !row.disabled,
        }
    }
}

/// Reads accounts from the `users` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn lookup(&self, username: &str) -> AuthResult<Option<CredentialRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT username, hashed_password, disabled, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| AuthError::CredentialStoreUnavailable(format!("user lookup failed: {err}")))?;

        Ok(row.map(CredentialRecord::from))
    }
}

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde::Serialize;

use crate::claims::AccessClaims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::keys::SigningKeys;
use crate::roles::Role;

pub const TOKEN_TYPE: &str = "bearer";

pub struct TokenSubject<'a> {
    pub username: &'a str,
    pub role: Option<Role>,
}

/// OAuth2 token response body.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    #[serde(skip)]
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<SigningKeys>,
    config: JwtConfig,
}

impl TokenIssuer {
    pub fn new(keys: Arc<SigningKeys>, config: JwtConfig) -> Self {
        Self { keys, config }
    }

    /// Sign an EdDSA token for `subject` valid for `ttl`, or the configured default.
    pub fn issue(&self, subject: TokenSubject<'_>, ttl: Option<Duration>) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + ttl.unwrap_or(self.config.default_ttl);

        let claims = AccessClaims {
            sub: subject.username,
            role: subject.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, self.keys.encoding())
            .map_err(|err| AuthError::Internal(format!("failed to sign access token: {err}")))?;

        Ok(IssuedToken {
            access_token,
            token_type: TOKEN_TYPE,
            expires_at,
        })
    }
}

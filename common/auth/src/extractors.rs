use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderValue};

use crate::error::{AuthError, AuthResult};
use crate::guards::AccessPolicy;
use crate::verifier::{AuthenticatedUser, JwtVerifier};

/// Verified bearer token and the account it resolves to.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthenticatedUser,
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);

        let header_value = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let token = parse_bearer(header_value)?;
        let user = verifier.verify(&token).await?;

        Ok(Self { user, token })
    }
}

/// Verified user that also passed policy `P`.
#[derive(Debug, Clone)]
pub struct Authorized<P> {
    pub user: AuthenticatedUser,
    _policy: PhantomData<fn() -> P>,
}

impl<P> Authorized<P> {
    pub fn into_user(self) -> AuthenticatedUser {
        self.user
    }
}

#[async_trait]
impl<S, P> FromRequestParts<S> for Authorized<P>
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
    P: AccessPolicy,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = AuthContext::from_request_parts(parts, state).await?;
        P::check(&context.user)?;
        Ok(Self {
            user: context.user,
            _policy: PhantomData,
        })
    }
}

fn parse_bearer(value: &HeaderValue) -> AuthResult<String> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    let (scheme, token) = raw
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthorization)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthorization);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token.to_owned())
}

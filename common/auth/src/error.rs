use axum::http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type AuthResult<T> = Result<T, AuthError>;

const CREDENTIALS_MESSAGE: &str = "Could not validate credentials";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("incorrect username or password")]
    InvalidCredentials,
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("token rejected: {0}")]
    TokenMalformed(String),
    #[error("token has expired")]
    TokenExpired,
    #[error("account for token subject is missing or disabled")]
    AccountInactiveOrMissing,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("role does not grant access")]
    InsufficientRole,
    #[error("key store unavailable: {0}")]
    KeyStoreUnavailable(String),
    #[error("failed to parse {0} key: {1}")]
    KeyParse(&'static str, String),
    #[error("credential store unavailable: {0}")]
    CredentialStoreUnavailable(String),
    #[error("internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::MissingAuthorization
            | AuthError::InvalidAuthorization
            | AuthError::TokenMalformed(_)
            | AuthError::TokenExpired
            | AuthError::AccountInactiveOrMissing => StatusCode::UNAUTHORIZED,
            AuthError::AccountDisabled | AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            AuthError::KeyStoreUnavailable(_)
            | AuthError::KeyParse(_, _)
            | AuthError::CredentialStoreUnavailable(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingAuthorization => "NOT_AUTHENTICATED",
            AuthError::InvalidAuthorization => "AUTH_HEADER",
            AuthError::TokenMalformed(_) | AuthError::AccountInactiveOrMissing => "AUTH_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::AccountDisabled => "ACCOUNT_DISABLED",
            AuthError::InsufficientRole => "FORBIDDEN",
            AuthError::KeyStoreUnavailable(_)
            | AuthError::KeyParse(_, _)
            | AuthError::CredentialStoreUnavailable(_)
            | AuthError::Internal(_) => "SERVER_ERROR",
        }
    }

    /// Client-facing message. Never carries the internal detail held by the variant.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Incorrect username or password",
            AuthError::MissingAuthorization => "Not authenticated",
            AuthError::InvalidAuthorization
            | AuthError::TokenMalformed(_)
            | AuthError::AccountInactiveOrMissing => CREDENTIALS_MESSAGE,
            AuthError::TokenExpired => "Token has expired",
            AuthError::AccountDisabled => "Inactive user",
            AuthError::InsufficientRole => "Not enough permissions",
            AuthError::KeyStoreUnavailable(_)
            | AuthError::KeyParse(_, _)
            | AuthError::CredentialStoreUnavailable(_)
            | AuthError::Internal(_) => "Internal server error",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::TokenMalformed(value.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "authentication infrastructure failure");
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.public_message(),
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

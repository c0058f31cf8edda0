use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use common_auth::{AuthError, IssuedToken, TokenSubject};
use common_http_errors::ApiError;
use serde::Deserialize;
use tracing::{info, warn};

use crate::app::AppState;

/// OAuth2 password-grant form. Extra fields such as `grant_type` and `scope` are ignored.
#[derive(Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

pub async fn issue_token(
    State(state): State<AppState>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Result<Json<IssuedToken>, Response> {
    let Form(TokenForm { username, password }) = form.map_err(|rejection| {
        state.record_login_metric("malformed");
        ApiError::validation(rejection.body_text()).into_response()
    })?;

    let record = match state.authenticator.authenticate(&username, &password).await {
        Ok(record) => record,
        Err(AuthError::InvalidCredentials) => {
            state.record_login_metric("invalid_credentials");
            return Err(AuthError::InvalidCredentials.into_response());
        }
        Err(err) => {
            warn!(error = %err, "login could not be completed");
            state.record_login_metric("error");
            return Err(err.into_response());
        }
    };

    let token = state
        .token_issuer
        .issue(
            TokenSubject {
                username: &record.username,
                role: record.role,
            },
            None,
        )
        .map_err(|err| {
            state.record_login_metric("error");
            err.into_response()
        })?;

    state.record_login_metric("success");
    info!(username = %record.username, expires_at = %token.expires_at, "access token issued");
    Ok(Json(token))
}

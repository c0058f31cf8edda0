use std::sync::Arc;

use anyhow::Result;
use axum::extract::{FromRef, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use chrono::Duration;
use common_auth::{
    Authenticator, CredentialStore, JwtConfig, JwtVerifier, PasswordVerifier, SigningKeys,
    TokenIssuer,
};
use common_http_errors::ApiError;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::booking_handlers::{
    accept_booking, delete_booking, list_bookings, reject_booking, submit_booking,
};
use crate::config::ServiceConfig;
use crate::health::ping;
use crate::metrics::ServiceMetrics;
use crate::repository::BookingRepository;
use crate::token_handlers::issue_token;

/// Knobs shared by the auth components, taken from [`ServiceConfig`] or set directly in tests.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub access_token_ttl: Duration,
    pub leeway_seconds: u64,
    pub bcrypt_cost: u32,
}

impl From<&ServiceConfig> for AuthSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            access_token_ttl: Duration::minutes(config.access_token_expire_minutes),
            leeway_seconds: config.token_leeway_seconds,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingRepository>,
    pub authenticator: Arc<Authenticator>,
    pub jwt_verifier: Arc<JwtVerifier>,
    pub token_issuer: Arc<TokenIssuer>,
    pub metrics: Arc<ServiceMetrics>,
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.token_issuer.clone()
    }
}

impl AppState {
    pub fn new(
        keys: Arc<SigningKeys>,
        credentials: Arc<dyn CredentialStore>,
        bookings: Arc<dyn BookingRepository>,
        settings: &AuthSettings,
    ) -> Result<Self> {
        let jwt_config = JwtConfig::new()
            .with_default_ttl(settings.access_token_ttl)
            .with_leeway(settings.leeway_seconds);
        let passwords = PasswordVerifier::new(settings.bcrypt_cost)?;

        Ok(Self {
            bookings,
            authenticator: Arc::new(Authenticator::new(credentials.clone(), passwords)),
            jwt_verifier: Arc::new(JwtVerifier::new(
                keys.clone(),
                jwt_config.clone(),
                credentials,
            )),
            token_issuer: Arc::new(TokenIssuer::new(keys, jwt_config)),
            metrics: Arc::new(ServiceMetrics::new()?),
        })
    }

    pub fn record_login_metric(&self, outcome: &str) {
        self.metrics.login_attempt(outcome);
    }

    pub fn record_booking_metric(&self, event: &str) {
        self.metrics.booking_event(event);
    }
}

async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            ApiError::Internal.into_response()
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ping/", get(ping))
        .route("/token", post(issue_token))
        .route("/booking/", post(submit_booking).get(list_bookings))
        .route("/booking/accept/", post(accept_booking))
        .route("/booking/reject/", post(reject_booking))
        .route("/booking/:id/", delete(delete_booking))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

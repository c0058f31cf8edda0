#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use booking_service::repository::InMemoryBookingRepository;
use booking_service::{build_router, AppState, AuthSettings};
use chrono::Duration;
use common_auth::{hash_password, CredentialRecord, InMemoryCredentialStore, Role, SigningKeys};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

pub const TEST_BCRYPT_COST: u32 = 4;
pub const ADMIN: (&str, &str) = ("admin", "admin-pw");
pub const REQUESTER: (&str, &str) = ("requester", "requester-pw");

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub credentials: InMemoryCredentialStore,
    pub bookings: InMemoryBookingRepository,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestApp {
    /// In-memory stores, the fixed test key pair and two seeded accounts.
    pub fn new() -> Result<Self> {
        let credentials = InMemoryCredentialStore::new();
        let bookings = InMemoryBookingRepository::new();
        let settings = AuthSettings {
            access_token_ttl: Duration::minutes(30),
            leeway_seconds: 0,
            bcrypt_cost: TEST_BCRYPT_COST,
        };
        let state = AppState::new(
            Arc::new(SigningKeys::test()?),
            Arc::new(credentials.clone()),
            Arc::new(bookings.clone()),
            &settings,
        )?;

        let app = Self {
            router: build_router(state.clone()),
            state,
            credentials,
            bookings,
        };
        app.seed_user(ADMIN.0, ADMIN.1, Role::Admin)?;
        app.seed_user(REQUESTER.0, REQUESTER.1, Role::Requester)?;
        Ok(app)
    }

    pub fn seed_user(&self, username: &str, password: &str, role: Role) -> Result<()> {
        let hash = hash_password(password, TEST_BCRYPT_COST)?;
        self.credentials
            .insert(CredentialRecord::new(username, hash, role));
        Ok(())
    }

    pub fn seed_user_with_raw_role(&self, username: &str, password: &str, role: &str) -> Result<()> {
        let hash = hash_password(password, TEST_BCRYPT_COST)?;
        self.credentials
            .insert(CredentialRecord::new(username, hash, Role::Requester).with_raw_role(role));
        Ok(())
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await?.to_bytes();
        let text = String::from_utf8(bytes.to_vec())?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(TestResponse {
            status,
            headers,
            body,
            text,
        })
    }

    pub async fn request_token(&self, username: &str, password: &str) -> Result<TestResponse> {
        let form = format!("username={username}&password={password}&grant_type=password");
        let request = Request::builder()
            .method("POST")
            .uri("/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))?;
        self.send(request).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let response = self.request_token(username, password).await?;
        if response.status != StatusCode::OK {
            return Err(anyhow!("login for {username} failed: {}", response.status));
        }
        response.body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("access_token missing"))
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }
}

pub fn submission_body() -> Value {
    serde_json::json!({
        "event_time": "2030-06-01T14:00:00Z",
        "address": {
            "street": "221B Baker Street",
            "city": "London",
            "country": "United Kingdom"
        },
        "topic": "Intro to ownership",
        "duration_minutes": 90,
        "requested_by": "organiser@example.com"
    })
}

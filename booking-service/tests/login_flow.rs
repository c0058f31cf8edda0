mod support;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common_auth::Role;
use support::{TestApp, ADMIN, REQUESTER};

#[tokio::test]
async fn valid_credentials_return_bearer_token() -> Result<()> {
    let app = TestApp::new()?;

    let response = app.request_token(ADMIN.0, ADMIN.1).await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["token_type"], "bearer");
    let token = response.body["access_token"]
        .as_str()
        .expect("access_token string");
    assert_eq!(token.split('.').count(), 3);
    assert!(response.body.get("expires_at").is_none());

    let user = app.state.jwt_verifier.verify(token).await?;
    assert_eq!(user.username, ADMIN.0);
    assert_eq!(user.role, Some(Role::Admin));
    assert_eq!(user.claims.role, Some(Role::Admin));

    let lifetime = user.claims.expires_at - user.claims.issued_at.expect("iat");
    assert_eq!(lifetime.num_minutes(), 30);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() -> Result<()> {
    let app = TestApp::new()?;

    let wrong = app.request_token(REQUESTER.0, "not-the-password").await?;
    let unknown = app.request_token("ghost", REQUESTER.1).await?;

    for response in [&wrong, &unknown] {
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["message"], "Incorrect username or password");
        assert_eq!(
            response.headers.get(header::WWW_AUTHENTICATE).expect("challenge"),
            "Bearer"
        );
    }
    assert_eq!(wrong.text, unknown.text);
    Ok(())
}

#[tokio::test]
async fn disabled_account_cannot_obtain_token() -> Result<()> {
    let app = TestApp::new()?;
    app.credentials.set_active(REQUESTER.0, false);

    let response = app.request_token(REQUESTER.0, REQUESTER.1).await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "INVALID_CREDENTIALS");
    Ok(())
}

#[tokio::test]
async fn missing_form_field_is_a_validation_error() -> Result<()> {
    let app = TestApp::new()?;
    let request = Request::builder()
        .method("POST")
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=admin"))?;

    let response = app.send(request).await?;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["code"], "validation_error");
    Ok(())
}

#[tokio::test]
async fn login_outcomes_are_counted() -> Result<()> {
    let app = TestApp::new()?;
    app.login(ADMIN.0, ADMIN.1).await?;
    app.request_token(ADMIN.0, "nope").await?;

    let metrics = app.call("GET", "/metrics", None, None).await?;
    assert_eq!(metrics.status, StatusCode::OK);
    assert!(metrics
        .text
        .contains("booking_login_attempts_total{outcome=\"success\"} 1"));
    assert!(metrics
        .text
        .contains("booking_login_attempts_total{outcome=\"invalid_credentials\"} 1"));
    Ok(())
}

#[tokio::test]
async fn token_survives_only_while_account_is_active() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.login(ADMIN.0, ADMIN.1).await?;

    let ok = app.call("GET", "/booking/", Some(&token), None).await?;
    assert_eq!(ok.status, StatusCode::OK);

    app.credentials.set_active(ADMIN.0, false);
    let rejected = app.call("GET", "/booking/", Some(&token), None).await?;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.body["message"], "Could not validate credentials");

    app.credentials.remove(ADMIN.0);
    let gone = app.call("GET", "/booking/", Some(&token), None).await?;
    assert_eq!(gone.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use talentpool_backend::models::user::Role;

use common::{TestApp, PASSWORD};

#[tokio::test]
async fn register_login_and_profile() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Rita",
                "email": "Rita@Example.com",
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
                "role": "recruiter",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["user"]["email"], "rita@example.com");
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "rita@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/user", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "recruiter");

    let (status, body) = app.request(Method::POST, "/api/auth/refresh", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, _) = app.request(Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn registration_rules() {
    let app = TestApp::new();
    app.user("Carl", Role::Candidate).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Carl again",
                "email": "carl@example.com",
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
                "role": "candidate",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["email"].is_array());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Mallory",
                "email": "mallory@example.com",
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
                "role": "admin",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["role"].is_array());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Nadia", "email": "nadia@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["password_confirmation"].is_array());
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let app = TestApp::new();
    app.user("Carl", Role::Candidate).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "carl@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_reset_flow() {
    let app = TestApp::new();
    app.user("Carl", Role::Candidate).await;

    for email in ["carl@example.com", "ghost@example.com"] {
        let (status, body) = app
            .request(
                Method::POST,
                "/api/auth/forgot-password",
                None,
                Some(json!({ "email": email })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());
    }

    let token = app
        .state
        .auth_service
        .request_password_reset("carl@example.com")
        .await
        .unwrap()
        .unwrap();

    let reset = |token: &str| {
        json!({
            "email": "carl@example.com",
            "token": token,
            "password": "a-new-password",
            "password_confirmation": "a-new-password",
        })
    };
    let (status, _) = app
        .request(Method::POST, "/api/auth/reset-password", None, Some(reset("bogus")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(Method::POST, "/api/auth/reset-password", None, Some(reset(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "carl@example.com", "password": "a-new-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

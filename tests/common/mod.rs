#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;
use tower::ServiceExt;

use talentpool_backend::{
    config::{Config, NotifierKind},
    models::user::{NewUser, Role},
    repositories::{memory::MemoryStore, Repositories, UserRepository},
    routes::app_router,
    utils::crypto::hash_password,
    AppState,
};

pub const PASSWORD: &str = "secret-password";
const BOUNDARY: &str = "talentpool-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub uploads: TempDir,
}

pub struct TestUser {
    pub id: i64,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().expect("uploads dir");
        let config = Config {
            server_address: "127.0.0.1:0".into(),
            database_url: None,
            database_max_connections: 1,
            jwt_secret: "test_secret_key".into(),
            jwt_ttl_minutes: 60,
            password_reset_ttl_minutes: 60,
            uploads_dir: uploads.path().to_path_buf(),
            status_notifier: NotifierKind::Log,
        };
        let store = MemoryStore::new();
        let state = AppState::new(&config, Repositories::in_memory(store.clone()));
        Self {
            router: app_router(state.clone()),
            state,
            store,
            uploads,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, JsonValue) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn multipart(
        &self,
        uri: &str,
        token: &str,
        cover_letter: Option<&str>,
        file: Option<(&str, &str, &[u8])>,
    ) -> (StatusCode, JsonValue) {
        let mut body: Vec<u8> = Vec::new();
        if let Some(text) = cover_letter {
            body.extend_from_slice(
                format!(
                    "--{b}\r\nContent-Disposition: form-data; name=\"cover_letter\"\r\n\r\n{t}\r\n",
                    b = BOUNDARY,
                    t = text
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, mime, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{b}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"{f}\"\r\nContent-Type: {m}\r\n\r\n",
                    b = BOUNDARY,
                    f = file_name,
                    m = mime
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .expect("multipart request");
        self.send(request).await
    }

    /// Registers through the API; admins are seeded directly since they
    /// cannot self-register.
    pub async fn user(&self, name: &str, role: Role) -> TestUser {
        let email = format!("{}@example.com", name.to_lowercase());
        if role == Role::Admin {
            let user = UserRepository::create(
                &self.store,
                NewUser {
                    name: name.into(),
                    email,
                    password_hash: hash_password(PASSWORD).expect("hash"),
                    role,
                },
            )
            .await
            .expect("seed admin");
            let issued = self.state.auth_service.issue_token(&user).expect("token");
            return TestUser {
                id: user.id,
                token: issued.token,
            };
        }

        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": PASSWORD,
                    "password_confirmation": PASSWORD,
                    "role": role.as_str(),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {}: {}", name, body);
        TestUser {
            id: body["user"]["id"].as_i64().expect("user id"),
            token: body["token"].as_str().expect("token").to_string(),
        }
    }

    pub async fn create_offer(&self, recruiter: &TestUser, overrides: JsonValue) -> i64 {
        let mut payload = offer_payload();
        if let (Some(target), Some(extra)) = (payload.as_object_mut(), overrides.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
        let (status, body) = self
            .request(
                Method::POST,
                "/api/job-offers",
                Some(&recruiter.token),
                Some(payload),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create offer: {}", body);
        body["job_offer"]["id"].as_i64().expect("offer id")
    }
}

pub fn offer_payload() -> JsonValue {
    json!({
        "title": "Rust backend engineer",
        "description": "Build and run the hiring platform API.",
        "location": "Lyon",
        "company_name": "Acme",
        "contract_type": "CDI",
        "salary_min": 40000,
        "salary_max": 55000,
        "expires_at": (Utc::now().date_naive() + Duration::days(30)).to_string(),
    })
}

pub fn pdf_of_size(len: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.7\n".to_vec();
    data.resize(len, b'x');
    data
}

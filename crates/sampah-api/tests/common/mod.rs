//! In-process harness: a real router over an in-memory database and a
//! temporary upload root.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use sampah_api::{AppState, AppStateInner, auth, router, storage::Storage};
use sampah_db::Database;
use sampah_types::time::DisplayZone;

pub const ADMIN_NAME: &str = "Pak Joko";
pub const ADMIN_EMAIL: &str = "admin@sekolah.id";
pub const ADMIN_PASSWORD: &str = "admin-rahasia";
pub const PASSWORD: &str = "rahasia123";

const BOUNDARY: &str = "sampah-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub uploads: TempDir,
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        data: &'a [u8],
    },
}

pub async fn spawn_app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();
    auth::seed_admin(&db, ADMIN_NAME, ADMIN_EMAIL, ADMIN_PASSWORD).unwrap();
    let storage = Storage::new(uploads.path().to_path_buf()).await.unwrap();

    let state: AppState = Arc::new(AppStateInner {
        db,
        storage,
        jwt_secret: "test-secret".to_string(),
        token_ttl: chrono::Duration::hours(1),
        zone: DisplayZone::default(),
    });

    TestApp {
        router: router(state.clone(), 10 * 1024 * 1024),
        state,
        uploads,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let req = request(Method::GET, path, token).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let req = request(Method::PUT, path, token).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn json(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let req = request(method, path, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        parts: &[Part<'_>],
    ) -> (StatusCode, Value) {
        let req = request(method, path, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(req).await
    }

    pub async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/register",
                None,
                serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": PASSWORD,
                    "school_name": "SD Negeri 5",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.json(
            Method::POST,
            "/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn admin_token(&self) -> String {
        let (status, body) = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn user_id(&self, token: &str) -> String {
        let (_, body) = self.get("/me", Some(token)).await;
        body["user"]["id"].as_str().unwrap().to_string()
    }

    /// Submit a deposit with every required field; returns the response.
    pub async fn create_deposit(
        &self,
        token: &str,
        waste_type: &str,
        bin_count: &str,
    ) -> (StatusCode, Value) {
        self.multipart(
            Method::POST,
            "/deposits",
            Some(token),
            &deposit_fields(waste_type, bin_count, "20/05/2024"),
        )
        .await
    }
}

pub fn deposit_fields<'a>(waste_type: &'a str, bin_count: &'a str, pickup_date: &'a str) -> Vec<Part<'a>> {
    vec![
        Part::Text("school_name", "SD Negeri 5"),
        Part::Text("contact_name", "Bu Sari"),
        Part::Text("contact_phone", "081234567890"),
        Part::Text("address", "Jl. Melati No. 3"),
        Part::Text("pickup_date", pickup_date),
        Part::Text("bin_count", bin_count),
        Part::Text("waste_type", waste_type),
    ]
}

fn request(method: Method, path: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(path);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

//! Common test utilities for integration tests
//!
//! Every test gets a fresh in-memory store behind the real router, so no
//! database is needed:
//! - Test user creation with ready-made access tokens
//! - JSON request helpers driving the router as a `tower::Service`

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use softdesk_api::app::{build_router, AppState};
use softdesk_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use softdesk_shared::auth::jwt::issue_token_pair;
use softdesk_shared::models::user::{CreateUser, User};
use softdesk_shared::store::{MemoryStore, Store};
use std::sync::Arc;
use tower::Service as _;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: axum::Router,
    pub config: Config,
}

/// A registered user and an access token for it
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> String {
        self.user.id.to_string()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/unused".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: JWT_SECRET.to_string(),
            },
        };

        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), config.clone()));

        Self { store, app, config }
    }

    /// Creates a user directly in the store
    ///
    /// The password hash is a placeholder, so these users cannot log in
    /// through `/api/token`; use `/signup` for that.
    pub async fn user(&self, username: &str) -> TestUser {
        let user = self
            .store
            .create_user(CreateUser {
                email: format!("{username}@example.com"),
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: "test_hash".to_string(),
            })
            .await
            .unwrap();

        let token = issue_token_pair(user.id, JWT_SECRET).unwrap().access;

        TestUser { user, token }
    }

    /// Sends a request and returns the status and JSON body (`Null` if empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, as_user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(&as_user.token), None)
            .await
    }

    pub async fn post(&self, uri: &str, as_user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(&as_user.token), Some(body))
            .await
    }

    pub async fn patch(&self, uri: &str, as_user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(&as_user.token), Some(body))
            .await
    }

    pub async fn put(&self, uri: &str, as_user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(&as_user.token), Some(body))
            .await
    }

    pub async fn delete(&self, uri: &str, as_user: &TestUser) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(&as_user.token), None)
            .await
    }

    /// Creates a project as `author`, returning its id
    pub async fn project(&self, author: &TestUser, title: &str) -> String {
        let (status, body) = self
            .post(
                "/projects",
                author,
                serde_json::json!({ "title": title, "description": "", "type": "BACKEND" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Adds `member` to the project, acting as `by`
    pub async fn add_member(&self, project_id: &str, by: &TestUser, member: &TestUser) {
        let (status, body) = self
            .post(
                &format!("/projects/{project_id}/users"),
                by,
                serde_json::json!({ "username": member.user.username }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    /// Creates an issue as `author` assigned to `assignee`, returning its id
    pub async fn issue(
        &self,
        project_id: &str,
        author: &TestUser,
        assignee: &TestUser,
        title: &str,
    ) -> String {
        let (status, body) = self
            .post(
                &format!("/projects/{project_id}/issues"),
                author,
                serde_json::json!({
                    "title": title,
                    "tag": "BUG",
                    "priority": "HIGH",
                    "status": "TODO",
                    "assignee_user_id": assignee.id(),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Posts a comment as `author`, returning its id
    pub async fn comment(
        &self,
        project_id: &str,
        issue_id: &str,
        author: &TestUser,
        text: &str,
    ) -> String {
        let (status, body) = self
            .post(
                &format!("/projects/{project_id}/issues/{issue_id}/comments"),
                author,
                serde_json::json!({ "description": text }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

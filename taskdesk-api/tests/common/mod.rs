//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An app wired to a fresh in-memory store
//! - Registration/login helpers
//! - A request helper returning status and JSON body

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::Config;
use taskdesk_shared::db::memory::MemoryStore;
use tower::Service as _;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub state: AppState,
}

impl TestContext {
    /// Creates a context with default settings
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Creates a context with extra configuration variables
    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        Self::from_config(test_config(vars))
    }

    /// Creates a context from an already built configuration
    pub fn from_config(config: Config) -> Self {
        let state = AppState::new(config, Arc::new(MemoryStore::new())).expect("valid app state");
        let app = build_router(state.clone());

        TestContext { app, state }
    }

    /// Sends a request and returns status plus parsed JSON body (`Null` if empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    /// Sends a prepared request
    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, body)
    }

    /// Registers a user and returns the response body
    pub async fn register(&self, name: &str, email: &str, password: &str, role: Option<&str>) -> (StatusCode, Value) {
        let mut body = json!({ "name": name, "email": email, "password": password });
        if let Some(role) = role {
            body["role"] = json!(role);
        }

        self.send(Method::POST, "/api/v1/auth/register", None, Some(body)).await
    }

    /// Logs in and returns the token, panicking on failure
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["token"].as_str().expect("token in login response").to_string()
    }

    /// Registers and logs in, returning (user id, token)
    pub async fn signed_in(&self, name: &str, email: &str, role: Option<&str>) -> (i64, String) {
        let (status, body) = self.register(name, email, "pw12345", role).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let token = self.login(email, "pw12345").await;
        (body["id"].as_i64().expect("user id"), token)
    }

    /// Creates a task and returns its JSON
    pub async fn create_task(&self, token: &str, body: Value) -> Value {
        let (status, body) = self.send(Method::POST, "/api/v1/tasks", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body
    }
}

/// Builds a configuration with test defaults plus `vars`
pub fn test_config(vars: &[(&str, &str)]) -> Config {
    let mut env: HashMap<String, String> = HashMap::from([
        ("JWT_SECRET".to_string(), TEST_SECRET.to_string()),
        // Cheap hashing keeps the suite fast
        ("PASSWORD_HASH_MEMORY_KIB".to_string(), "1024".to_string()),
        ("PASSWORD_HASH_ITERATIONS".to_string(), "1".to_string()),
        ("PASSWORD_HASH_PARALLELISM".to_string(), "1".to_string()),
    ]);
    for (key, value) in vars {
        env.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| env.get(key).cloned()).expect("valid test config")
}

// SPDX-License-Identifier: MIT

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use serde_json::Value;
use userdeck::config::Config;
use userdeck::db::Db;
use userdeck::middleware::auth::create_jwt;
use userdeck::models::{NewUser, User};
use userdeck::routes::create_router;
use userdeck::services::{password, ActivityLogger};
use userdeck::AppState;

/// Create a test app backed by an in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Db::connect_in_memory()
        .await
        .expect("Failed to create in-memory database");
    let activity_log = ActivityLogger::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        activity_log,
    });

    (create_router(state.clone()), state)
}

/// Insert a user directly, bypassing the registration endpoint.
#[allow(dead_code)]
pub async fn seed_user(
    state: &Arc<AppState>,
    username: &str,
    email: &str,
    plaintext_password: &str,
    is_admin: bool,
) -> User {
    state
        .db
        .insert_user(&NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password::hash_password(plaintext_password)
                .expect("Failed to hash test password"),
            is_admin,
            first_name: None,
            last_name: None,
            phone: None,
        })
        .await
        .expect("Failed to seed test user")
}

/// Create a session token for a seeded user.
#[allow(dead_code)]
pub fn auth_token(state: &Arc<AppState>, user_id: i64) -> String {
    create_jwt(
        user_id,
        state.config.session_ttl_minutes,
        &state.config.jwt_signing_key,
    )
    .expect("Failed to create test JWT")
}

/// Build a GET request, optionally with a bearer token.
#[allow(dead_code)]
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Build a JSON request with the given method and optional bearer token.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body should be JSON")
}

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use huddle::api::AppState;
use huddle::database::{self, DbPool};
use huddle::models::user::{Presence, User};
use huddle::server::route_builder::build_router;
use huddle::services::auth::insert_user;
use huddle::utils::jwt::JwtService;

pub const TEST_SECRET: &str = "test-secret";

pub async fn test_state() -> Arc<AppState> {
    let db = database::create_memory_pool()
        .await
        .expect("in-memory database");
    let jwt_service = Arc::new(JwtService::new(TEST_SECRET, chrono::Duration::hours(1)));
    Arc::new(AppState { db, jwt_service })
}

pub fn app(state: &Arc<AppState>) -> Router {
    build_router(state.clone())
}

/// Inserts a user directly, skipping password hashing.
pub async fn create_user(pool: &DbPool, username: &str) -> User {
    let user = User::new(
        username.to_string(),
        format!("{}@example.com", username),
        "not-a-real-hash".to_string(),
        None,
        Presence::Offline,
    );
    let mut conn = pool.acquire().await.expect("connection");
    insert_user(&mut conn, &user).await.expect("insert user");
    user
}

pub fn token_for(state: &Arc<AppState>, user: &User) -> String {
    state
        .jwt_service
        .generate_token(&user.id)
        .expect("token")
}

pub async fn count(pool: &DbPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool.as_ref())
        .await
        .expect("count")
}

pub async fn send(
    app: &Router,
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
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use crate::database::DbPool;
use crate::models::user::UserResponse;
use crate::services::auth::{
    LoginRequest, LoginResponse, RegisterRequest, login_user, register_user,
};
use crate::utils::error::AppResult;
use crate::utils::jwt::JwtService;

pub struct AppState {
    pub db: DbPool,
    pub jwt_service: Arc<JwtService>,
}

async fn health_check() -> &'static str {
    "OK"
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = register_user(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = login_user(&state.db, payload, &state.jwt_service).await?;
    tracing::info!("User {} logged in", response.user.id);
    Ok(Json(response))
}

pub fn health() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}

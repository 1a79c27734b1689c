use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::AppState;
use crate::middleware::auth::AuthUser;
use crate::models::message::{Message, MessageWithSender};
use crate::models::user::UserResponse;
use crate::services::message::{MessageRequest, list_received_messages, send_direct_message};
use crate::services::user::{UpdateAccountRequest, delete_account, get_account, update_account};
use crate::utils::error::AppResult;

async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(get_account(&state.db, &user.id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateAccountRequest>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(update_account(&state.db, &user.id, req).await?))
}

async fn destroy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(delete_account(&state.db, &user.id).await?))
}

async fn inbox(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Vec<MessageWithSender>>> {
    Ok(Json(list_received_messages(&state.db, &user.id).await?))
}

async fn send(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(receiver_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let message = send_direct_message(&state.db, &user.id, &receiver_id, req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(show).put(update).patch(update).delete(destroy))
        .route("/message", get(inbox))
        .route("/:user_id/message", post(send))
}

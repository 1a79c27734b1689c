use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use std::sync::Arc;

use crate::api::AppState;
use crate::middleware::auth::AuthUser;
use crate::models::message::{Message, MessageWithSender};
use crate::services::message::{
    MessageRequest, delete_channel_message, delete_message,
    get_channel_message, list_channel_messages, post_channel_message, update_channel_message,
    update_message,
};
use crate::utils::error::AppResult;

async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, channel_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<MessageWithSender>>> {
    let messages = list_channel_messages(&state.db, &user.id, &server_id, &channel_id).await?;
    Ok(Json(messages))
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, channel_id)): Path<(String, String)>,
    Json(req): Json<MessageRequest>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let message = post_channel_message(&state.db, &user.id, &server_id, &channel_id, req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, channel_id, message_id)): Path<(String, String, String)>,
) -> AppResult<Json<Message>> {
    let message =
        get_channel_message(&state.db, &user.id, &server_id, &channel_id, &message_id).await?;
    Ok(Json(message))
}

async fn update_in_channel(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, channel_id, message_id)): Path<(String, String, String)>,
    Json(req): Json<MessageRequest>,
) -> AppResult<Json<Message>> {
    let message = update_channel_message(
        &state.db,
        &user.id,
        &server_id,
        &channel_id,
        &message_id,
        req,
    )
    .await?;
    Ok(Json(message))
}

async fn delete_in_channel(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, channel_id, message_id)): Path<(String, String, String)>,
) -> AppResult<Json<Message>> {
    let message =
        delete_channel_message(&state.db, &user.id, &server_id, &channel_id, &message_id).await?;
    Ok(Json(message))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> AppResult<Json<Message>> {
    Ok(Json(update_message(&state.db, &user.id, &message_id, req).await?))
}

async fn destroy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> AppResult<Json<Message>> {
    Ok(Json(delete_message(&state.db, &user.id, &message_id).await?))
}

/// Messages addressed through their server and channel, merged into the
/// server router.
pub fn channel_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/:server_id/channel/:channel_id/message",
            get(list).post(post_message),
        )
        .route(
            "/:server_id/channel/:channel_id/message/:message_id",
            get(show)
                .put(update_in_channel)
                .patch(update_in_channel)
                .delete(delete_in_channel),
        )
}

/// Any message by id, channel or direct. Sender only.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:message_id", put(update).patch(update).delete(destroy))
}

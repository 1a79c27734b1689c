use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;

use crate::api::AppState;
use crate::middleware::auth::AuthUser;
use crate::models::channel::Channel;
use crate::services::channel::{
    ChannelRequest, create_channel, delete_channel, get_channel, list_channels, update_channel,
};
use crate::utils::error::AppResult;

async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(server_id): Path<String>,
) -> AppResult<Json<Vec<Channel>>> {
    Ok(Json(list_channels(&state.db, &user.id, &server_id).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(server_id): Path<String>,
    Json(req): Json<ChannelRequest>,
) -> AppResult<(StatusCode, Json<Channel>)> {
    let channel = create_channel(&state.db, &user.id, &server_id, req).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, channel_id)): Path<(String, String)>,
) -> AppResult<Json<Channel>> {
    Ok(Json(get_channel(&state.db, &user.id, &server_id, &channel_id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, channel_id)): Path<(String, String)>,
    Json(req): Json<ChannelRequest>,
) -> AppResult<Json<Channel>> {
    let channel = update_channel(&state.db, &user.id, &server_id, &channel_id, req).await?;
    Ok(Json(channel))
}

async fn destroy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, channel_id)): Path<(String, String)>,
) -> AppResult<Json<Channel>> {
    let channel = delete_channel(&state.db, &user.id, &server_id, &channel_id).await?;
    Ok(Json(channel))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:server_id/channel", get(list).post(create))
        .route(
            "/:server_id/channel/:channel_id",
            get(show).put(update).patch(update).delete(destroy),
        )
}

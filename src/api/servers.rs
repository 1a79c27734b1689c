use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::{AppState, channels, members, messages};
use crate::middleware::auth::AuthUser;
use crate::models::server::Server;
use crate::models::server_member::ServerMember;
use crate::services::member::{join_server, leave_server};
use crate::services::server::{
    ServerRequest, create_server, delete_server, get_server, list_user_servers, update_server,
};
use crate::utils::error::AppResult;

async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ServerRequest>,
) -> AppResult<(StatusCode, Json<Server>)> {
    let server = create_server(&state.db, &user.id, req).await?;
    Ok((StatusCode::CREATED, Json(server)))
}

async fn list_servers(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Vec<Server>>> {
    Ok(Json(list_user_servers(&state.db, &user.id).await?))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(server_id): Path<String>,
) -> AppResult<Json<Server>> {
    Ok(Json(get_server(&state.db, &user.id, &server_id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(server_id): Path<String>,
    Json(req): Json<ServerRequest>,
) -> AppResult<Json<Server>> {
    Ok(Json(update_server(&state.db, &user.id, &server_id, req).await?))
}

async fn destroy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(server_id): Path<String>,
) -> AppResult<Json<Server>> {
    Ok(Json(delete_server(&state.db, &user.id, &server_id).await?))
}

async fn join(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(server_id): Path<String>,
) -> AppResult<(StatusCode, Json<ServerMember>)> {
    let member = join_server(&state.db, &user.id, &server_id).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn leave(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(server_id): Path<String>,
) -> AppResult<Json<ServerMember>> {
    Ok(Json(leave_server(&state.db, &user.id, &server_id).await?))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_servers).post(create))
        .route(
            "/:server_id",
            get(show).put(update).patch(update).delete(destroy),
        )
        .route("/:server_id/join", post(join))
        .route("/:server_id/leave", post(leave))
        .merge(members::router())
        .merge(channels::router())
        .merge(messages::channel_router())
        .with_state(state)
}

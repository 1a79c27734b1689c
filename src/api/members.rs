use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::AppState;
use crate::middleware::auth::AuthUser;
use crate::models::server_member::{ServerMember, ServerMemberWithUser};
use crate::services::member::{
    UpdateMemberRequest, add_member, get_member, list_members, remove_member, update_member,
};
use crate::utils::error::AppResult;

async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(server_id): Path<String>,
) -> AppResult<Json<Vec<ServerMemberWithUser>>> {
    Ok(Json(list_members(&state.db, &user.id, &server_id).await?))
}

async fn add(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, user_id)): Path<(String, String)>,
) -> AppResult<(StatusCode, Json<ServerMember>)> {
    let member = add_member(&state.db, &user.id, &server_id, &user_id).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, member_id)): Path<(String, String)>,
) -> AppResult<Json<ServerMember>> {
    Ok(Json(get_member(&state.db, &user.id, &server_id, &member_id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, member_id)): Path<(String, String)>,
    Json(req): Json<UpdateMemberRequest>,
) -> AppResult<Json<ServerMember>> {
    let member = update_member(&state.db, &user.id, &server_id, &member_id, req).await?;
    Ok(Json(member))
}

async fn destroy(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((server_id, member_id)): Path<(String, String)>,
) -> AppResult<Json<ServerMember>> {
    let member = remove_member(&state.db, &user.id, &server_id, &member_id).await?;
    Ok(Json(member))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:server_id/member", get(list))
        .route("/:server_id/member/add/:user_id", post(add))
        .route(
            "/:server_id/member/:member_id",
            get(show).put(update).patch(update).delete(destroy),
        )
}

//! Existence guards for the resource path.
//!
//! A child is only reachable through the parent it actually belongs to. A
//! child that exists under a different parent is reported the same way as
//! a missing one, so nothing leaks across servers.

use sqlx::SqliteConnection;

use crate::models::channel::Channel;
use crate::models::message::Message;
use crate::models::server::Server;
use crate::models::server_member::ServerMember;
use crate::models::user::User;
use crate::utils::error::{AppError, AppResult};

pub async fn find_server(conn: &mut SqliteConnection, server_id: &str) -> AppResult<Server> {
    sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE id = ?")
        .bind(server_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("server with id {} not found", server_id)))
}

pub async fn find_user(conn: &mut SqliteConnection, user_id: &str) -> AppResult<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user with id {} not found", user_id)))
}

pub async fn find_channel(conn: &mut SqliteConnection, channel_id: &str) -> AppResult<Channel> {
    sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = ?")
        .bind(channel_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("channel with id {} not found", channel_id)))
}

pub async fn find_message(conn: &mut SqliteConnection, message_id: &str) -> AppResult<Message> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
        .bind(message_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("message with id {} not found", message_id)))
}

pub async fn find_server_member(
    conn: &mut SqliteConnection,
    member_id: &str,
) -> AppResult<ServerMember> {
    sqlx::query_as::<_, ServerMember>("SELECT * FROM server_members WHERE id = ?")
        .bind(member_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("server member with id {} not found", member_id)))
}

fn ensure_parent(
    child_kind: &str,
    child_id: &str,
    parent_kind: &str,
    parent_id: &str,
    actual_parent: Option<&str>,
) -> AppResult<()> {
    if actual_parent == Some(parent_id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!(
            "{} with id {} not found in {} {}",
            child_kind, child_id, parent_kind, parent_id
        )))
    }
}

/// `server` has already been loaded, so only the child lookup and the
/// foreign key comparison remain.
pub async fn verify_channel_belongs(
    conn: &mut SqliteConnection,
    server: &Server,
    channel_id: &str,
) -> AppResult<Channel> {
    let channel = find_channel(conn, channel_id).await?;
    ensure_parent(
        "channel",
        channel_id,
        "server",
        &server.id,
        Some(&channel.server_id),
    )?;
    Ok(channel)
}

pub async fn verify_member_belongs(
    conn: &mut SqliteConnection,
    server: &Server,
    member_id: &str,
) -> AppResult<ServerMember> {
    let member = find_server_member(conn, member_id).await?;
    ensure_parent(
        "server member",
        member_id,
        "server",
        &server.id,
        Some(&member.server_id),
    )?;
    Ok(member)
}

pub async fn verify_message_belongs(
    conn: &mut SqliteConnection,
    channel: &Channel,
    message_id: &str,
) -> AppResult<Message> {
    let message = find_message(conn, message_id).await?;
    ensure_parent(
        "message",
        message_id,
        "channel",
        &channel.id,
        message.channel_id.as_deref(),
    )?;
    Ok(message)
}

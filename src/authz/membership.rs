//! Membership questions about a (user, server) pair.
//!
//! All answers come from `server_members` rows (or the server's
//! `creator_id`). A missing row is a negative answer, not an error.

use sqlx::{Row, SqliteConnection};

use crate::models::server::Server;
use crate::models::server_member::ServerMember;
use crate::utils::error::AppResult;

pub async fn find_member(
    conn: &mut SqliteConnection,
    user_id: &str,
    server_id: &str,
) -> AppResult<Option<ServerMember>> {
    let member = sqlx::query_as::<_, ServerMember>(
        "SELECT * FROM server_members WHERE server_id = ? AND user_id = ?",
    )
    .bind(server_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(member)
}

pub async fn is_member(
    conn: &mut SqliteConnection,
    user_id: &str,
    server_id: &str,
) -> AppResult<bool> {
    let count = sqlx::query(
        "SELECT COUNT(*) as count FROM server_members WHERE server_id = ? AND user_id = ?",
    )
    .bind(server_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?
    .get::<i64, _>("count");

    Ok(count > 0)
}

pub async fn is_admin(
    conn: &mut SqliteConnection,
    user_id: &str,
    server_id: &str,
) -> AppResult<bool> {
    let count = sqlx::query(
        "SELECT COUNT(*) as count FROM server_members
         WHERE server_id = ? AND user_id = ? AND is_admin = 1",
    )
    .bind(server_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?
    .get::<i64, _>("count");

    Ok(count > 0)
}

pub async fn is_creator(
    conn: &mut SqliteConnection,
    user_id: &str,
    server_id: &str,
) -> AppResult<bool> {
    let server = sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE id = ?")
        .bind(server_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(server.is_some_and(|server| server.is_creator(user_id)))
}

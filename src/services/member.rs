use serde::{Deserialize, Serialize};

use crate::authz::{cascade, policy};
use crate::database::{self, DbPool};
use crate::models::server_member::{ServerMember, ServerMemberWithUser, ServerRole};
use crate::utils::error::AppResult;
use crate::utils::validation::required;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub is_admin: Option<bool>,
}

pub async fn list_members(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
) -> AppResult<Vec<ServerMemberWithUser>> {
    let mut tx = database::begin_read(pool).await?;
    let grant = policy::view_server(&mut tx, actor_id, server_id).await?;

    let members = sqlx::query_as::<_, ServerMemberWithUser>(
        "SELECT sm.*, u.username FROM server_members sm
         JOIN users u ON u.id = sm.user_id
         WHERE sm.server_id = ?
         ORDER BY sm.joined_at ASC, sm.rowid ASC",
    )
    .bind(&grant.server.id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(members)
}

pub async fn get_member(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    member_id: &str,
) -> AppResult<ServerMember> {
    let mut tx = database::begin_read(pool).await?;
    let grant = policy::view_member(&mut tx, actor_id, server_id, member_id).await?;
    tx.commit().await?;
    Ok(grant.target)
}

/// Self-service join. The new member is never an admin.
pub async fn join_server(pool: &DbPool, actor_id: &str, server_id: &str) -> AppResult<ServerMember> {
    let mut tx = database::begin(pool).await?;
    let server = policy::join_server(&mut tx, actor_id, server_id).await?;
    let member = cascade::insert_member(&mut tx, &server.id, actor_id, ServerRole::Member).await?;
    tx.commit().await?;

    tracing::info!("User {} joined server {}", actor_id, server.id);
    Ok(member)
}

pub async fn add_member(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    user_id: &str,
) -> AppResult<ServerMember> {
    let mut tx = database::begin(pool).await?;
    let grant = policy::add_member(&mut tx, actor_id, server_id, user_id).await?;
    let member =
        cascade::insert_member(&mut tx, &grant.server.id, &grant.user.id, ServerRole::Member)
            .await?;
    tx.commit().await?;

    tracing::info!(
        "User {} added {} to server {}",
        actor_id,
        grant.user.id,
        grant.server.id
    );
    Ok(member)
}

/// Promote or demote. The creator's own record cannot be changed.
pub async fn update_member(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    member_id: &str,
    request: UpdateMemberRequest,
) -> AppResult<ServerMember> {
    let is_admin = required(request.is_admin, "is_admin")?;

    let mut tx = database::begin(pool).await?;
    let grant = policy::manage_member(&mut tx, actor_id, server_id, member_id).await?;
    let member = cascade::set_member_admin(&mut tx, &grant.target, is_admin).await?;
    tx.commit().await?;

    tracing::info!(
        "User {} set admin={} on member {} of server {}",
        actor_id,
        is_admin,
        member.id,
        member.server_id
    );
    Ok(member)
}

pub async fn remove_member(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    member_id: &str,
) -> AppResult<ServerMember> {
    let mut tx = database::begin(pool).await?;
    let grant = policy::manage_member(&mut tx, actor_id, server_id, member_id).await?;
    cascade::remove_member(&mut tx, &grant.target).await?;
    tx.commit().await?;

    tracing::info!(
        "User {} removed member {} from server {}",
        actor_id,
        grant.target.id,
        grant.server.id
    );
    Ok(grant.target)
}

/// The caller drops their own membership. The creator cannot leave.
pub async fn leave_server(pool: &DbPool, actor_id: &str, server_id: &str) -> AppResult<ServerMember> {
    let mut tx = database::begin(pool).await?;
    let grant = policy::leave_server(&mut tx, actor_id, server_id).await?;
    cascade::remove_member(&mut tx, &grant.member).await?;
    tx.commit().await?;

    tracing::info!("User {} left server {}", actor_id, grant.server.id);
    Ok(grant.member)
}

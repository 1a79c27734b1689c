use serde::{Deserialize, Serialize};

use crate::authz::{cascade, policy};
use crate::database::{self, DbPool};
use crate::models::channel::Channel;
use crate::utils::error::AppResult;
use crate::utils::validation::{required, validate_channel_name};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChannelRequest {
    pub name: Option<String>,
}

pub async fn list_channels(pool: &DbPool, actor_id: &str, server_id: &str) -> AppResult<Vec<Channel>> {
    let mut tx = database::begin_read(pool).await?;
    let grant = policy::view_server(&mut tx, actor_id, server_id).await?;

    let channels = sqlx::query_as::<_, Channel>(
        "SELECT * FROM channels WHERE server_id = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(&grant.server.id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(channels)
}

pub async fn get_channel(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
) -> AppResult<Channel> {
    let mut tx = database::begin_read(pool).await?;
    let grant = policy::view_channel(&mut tx, actor_id, server_id, channel_id).await?;
    tx.commit().await?;
    Ok(grant.channel)
}

/// Any member may open a channel.
pub async fn create_channel(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    request: ChannelRequest,
) -> AppResult<Channel> {
    let name = required(request.name, "name")?;
    validate_channel_name(&name)?;

    let mut tx = database::begin(pool).await?;
    let grant = policy::view_server(&mut tx, actor_id, server_id).await?;
    let channel = Channel::new(grant.server.id.clone(), actor_id.to_string(), name);

    sqlx::query(
        "INSERT INTO channels (id, server_id, creator_id, name, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&channel.id)
    .bind(&channel.server_id)
    .bind(&channel.creator_id)
    .bind(&channel.name)
    .bind(&channel.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Channel '{}' ({}) created in server {}",
        channel.name,
        channel.id,
        channel.server_id
    );
    Ok(channel)
}

pub async fn update_channel(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
    request: ChannelRequest,
) -> AppResult<Channel> {
    let name = required(request.name, "name")?;
    validate_channel_name(&name)?;

    let mut tx = database::begin(pool).await?;
    let grant = policy::manage_channel(&mut tx, actor_id, server_id, channel_id).await?;

    sqlx::query("UPDATE channels SET name = ? WHERE id = ?")
        .bind(&name)
        .bind(&grant.channel.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Channel {
        name,
        ..grant.channel
    })
}

/// Deletes the channel and every message posted in it.
pub async fn delete_channel(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
) -> AppResult<Channel> {
    let mut tx = database::begin(pool).await?;
    let grant = policy::manage_channel(&mut tx, actor_id, server_id, channel_id).await?;
    cascade::delete_cascading(&mut tx, cascade::Table::Channels, &grant.channel.id).await?;
    tx.commit().await?;

    tracing::info!(
        "Channel {} deleted from server {} by {}",
        grant.channel.id,
        grant.server.id,
        actor_id
    );
    Ok(grant.channel)
}

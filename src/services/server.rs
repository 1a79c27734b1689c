use serde::{Deserialize, Serialize};

use crate::authz::{cascade, policy};
use crate::database::{self, DbPool};
use crate::models::server::Server;
use crate::utils::error::AppResult;
use crate::utils::validation::{required, validate_server_name};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerRequest {
    pub name: Option<String>,
}

/// The creator becomes the server's first member, as admin, in the same
/// transaction that creates the server.
pub async fn create_server(
    pool: &DbPool,
    actor_id: &str,
    request: ServerRequest,
) -> AppResult<Server> {
    let name = required(request.name, "name")?;
    validate_server_name(&name)?;

    let mut tx = database::begin(pool).await?;
    let (server, _creator) =
        cascade::create_server_with_creator(&mut tx, name, actor_id.to_string()).await?;
    tx.commit().await?;

    tracing::info!("Server '{}' ({}) created by {}", server.name, server.id, actor_id);
    Ok(server)
}

pub async fn list_user_servers(pool: &DbPool, actor_id: &str) -> AppResult<Vec<Server>> {
    let servers = sqlx::query_as::<_, Server>(
        "SELECT s.* FROM servers s
         JOIN server_members sm ON sm.server_id = s.id
         WHERE sm.user_id = ?
         ORDER BY s.created_at ASC, s.rowid ASC",
    )
    .bind(actor_id)
    .fetch_all(pool.as_ref())
    .await?;

    Ok(servers)
}

pub async fn get_server(pool: &DbPool, actor_id: &str, server_id: &str) -> AppResult<Server> {
    let mut tx = database::begin_read(pool).await?;
    let grant = policy::view_server(&mut tx, actor_id, server_id).await?;
    tx.commit().await?;
    Ok(grant.server)
}

pub async fn update_server(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    request: ServerRequest,
) -> AppResult<Server> {
    let name = required(request.name, "name")?;
    validate_server_name(&name)?;

    let mut tx = database::begin(pool).await?;
    let server = policy::manage_server(&mut tx, actor_id, server_id).await?;

    sqlx::query("UPDATE servers SET name = ? WHERE id = ?")
        .bind(&name)
        .bind(&server.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Server { name, ..server })
}

/// Deletes the server together with its members, channels and their
/// messages.
pub async fn delete_server(pool: &DbPool, actor_id: &str, server_id: &str) -> AppResult<Server> {
    let mut tx = database::begin(pool).await?;
    let server = policy::manage_server(&mut tx, actor_id, server_id).await?;
    let removed = cascade::delete_cascading(&mut tx, cascade::Table::Servers, &server.id).await?;
    tx.commit().await?;

    tracing::info!(
        "Server '{}' ({}) deleted by {}, {} rows removed",
        server.name,
        server.id,
        actor_id,
        removed
    );
    Ok(server)
}

//! Ownership graph, cascading deletes, and the writes that must keep the
//! creator's membership intact.
//!
//! The schema declares plain foreign keys with no delete actions. Removing
//! a row means walking [`OWNERSHIP`] from that row, deleting children
//! before their parents, all on the caller's transaction.

use sqlx::{Row, SqliteConnection};

use crate::models::server::Server;
use crate::models::server_member::{ServerMember, ServerRole};
use crate::utils::error::{AppError, AppResult, Denial};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Servers,
    ServerMembers,
    Channels,
    Messages,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Servers => "servers",
            Table::ServerMembers => "server_members",
            Table::Channels => "channels",
            Table::Messages => "messages",
        }
    }
}

/// `child.foreign_key` references `parent.id`, and the parent owns the
/// child's lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct Ownership {
    pub parent: Table,
    pub child: Table,
    pub foreign_key: &'static str,
}

pub const OWNERSHIP: &[Ownership] = &[
    Ownership {
        parent: Table::Users,
        child: Table::Servers,
        foreign_key: "creator_id",
    },
    Ownership {
        parent: Table::Users,
        child: Table::ServerMembers,
        foreign_key: "user_id",
    },
    Ownership {
        parent: Table::Users,
        child: Table::Channels,
        foreign_key: "creator_id",
    },
    Ownership {
        parent: Table::Users,
        child: Table::Messages,
        foreign_key: "sender_id",
    },
    Ownership {
        parent: Table::Users,
        child: Table::Messages,
        foreign_key: "receiver_id",
    },
    Ownership {
        parent: Table::Servers,
        child: Table::ServerMembers,
        foreign_key: "server_id",
    },
    Ownership {
        parent: Table::Servers,
        child: Table::Channels,
        foreign_key: "server_id",
    },
    Ownership {
        parent: Table::Channels,
        child: Table::Messages,
        foreign_key: "channel_id",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStep {
    pub table: Table,
    pub sql: String,
}

/// Post-order walk of the ownership graph rooted at one row of `root`.
/// Each statement binds the root id exactly once.
pub fn deletion_plan(root: Table) -> Vec<DeleteStep> {
    let mut plan = Vec::new();
    collect_deletes(root, "id = ?".to_string(), &mut plan);
    plan
}

fn collect_deletes(table: Table, condition: String, plan: &mut Vec<DeleteStep>) {
    for edge in OWNERSHIP.iter().filter(|edge| edge.parent == table) {
        let child_condition = format!(
            "{} IN (SELECT id FROM {} WHERE {})",
            edge.foreign_key,
            table.name(),
            condition
        );
        collect_deletes(edge.child, child_condition, plan);
    }

    plan.push(DeleteStep {
        table,
        sql: format!("DELETE FROM {} WHERE {}", table.name(), condition),
    });
}

/// Deletes the row `root`/`id` and everything it owns. Returns the total
/// number of rows removed.
pub async fn delete_cascading(
    conn: &mut SqliteConnection,
    root: Table,
    id: &str,
) -> AppResult<u64> {
    let mut removed = 0;

    for step in deletion_plan(root) {
        let result = sqlx::query(&step.sql).bind(id).execute(&mut *conn).await?;
        removed += result.rows_affected();
    }

    tracing::debug!("Cascade from {} {} removed {} rows", root.name(), id, removed);
    Ok(removed)
}

/// Inserts the server and its creator's admin membership. Atomic only
/// together with the caller's transaction.
pub async fn create_server_with_creator(
    conn: &mut SqliteConnection,
    name: String,
    creator_id: String,
) -> AppResult<(Server, ServerMember)> {
    let server = Server::new(name, creator_id.clone());

    sqlx::query("INSERT INTO servers (id, name, creator_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(&server.id)
        .bind(&server.name)
        .bind(&server.creator_id)
        .bind(&server.created_at)
        .execute(&mut *conn)
        .await?;

    let member = insert_member(conn, &server.id, &creator_id, ServerRole::Admin).await?;
    ensure_creator_admin(conn, &server.id).await?;

    Ok((server, member))
}

/// The UNIQUE(server_id, user_id) constraint turns a lost race into
/// `Conflict::AlreadyMember`.
pub async fn insert_member(
    conn: &mut SqliteConnection,
    server_id: &str,
    user_id: &str,
    role: ServerRole,
) -> AppResult<ServerMember> {
    let member = ServerMember::new(server_id.to_string(), user_id.to_string(), role);

    sqlx::query(
        "INSERT INTO server_members (id, server_id, user_id, is_admin, joined_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&member.id)
    .bind(&member.server_id)
    .bind(&member.user_id)
    .bind(member.is_admin)
    .bind(&member.joined_at)
    .execute(&mut *conn)
    .await?;

    Ok(member)
}

/// Sets the admin flag unless the record belongs to the server creator.
/// The creator check lives in the UPDATE itself, so it holds at write time.
pub async fn set_member_admin(
    conn: &mut SqliteConnection,
    member: &ServerMember,
    is_admin: bool,
) -> AppResult<ServerMember> {
    let result = sqlx::query(
        "UPDATE server_members SET is_admin = ?
         WHERE id = ?
           AND user_id <> (SELECT creator_id FROM servers WHERE id = server_members.server_id)",
    )
    .bind(is_admin)
    .bind(&member.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(refused_member_write(conn, member).await);
    }

    ensure_creator_admin(conn, &member.server_id).await?;

    Ok(ServerMember {
        is_admin,
        ..member.clone()
    })
}

/// Deletes a member record unless it belongs to the server creator.
pub async fn remove_member(conn: &mut SqliteConnection, member: &ServerMember) -> AppResult<()> {
    let result = sqlx::query(
        "DELETE FROM server_members
         WHERE id = ?
           AND user_id <> (SELECT creator_id FROM servers WHERE id = server_members.server_id)",
    )
    .bind(&member.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(refused_member_write(conn, member).await);
    }

    ensure_creator_admin(conn, &member.server_id).await?;
    Ok(())
}

/// A guarded write touched nothing: either the row vanished or it is the
/// creator's.
async fn refused_member_write(conn: &mut SqliteConnection, member: &ServerMember) -> AppError {
    let still_exists = sqlx::query("SELECT COUNT(*) as count FROM server_members WHERE id = ?")
        .bind(&member.id)
        .fetch_one(&mut *conn)
        .await
        .map(|row| row.get::<i64, _>("count") > 0);

    match still_exists {
        Ok(true) => AppError::Forbidden(Denial::CreatorProtected),
        Ok(false) => AppError::NotFound(format!("server member with id {} not found", member.id)),
        Err(e) => e.into(),
    }
}

/// The creator must hold exactly one admin membership of their server.
pub async fn ensure_creator_admin(conn: &mut SqliteConnection, server_id: &str) -> AppResult<()> {
    let count = sqlx::query(
        "SELECT COUNT(*) as count FROM server_members sm
         JOIN servers s ON s.id = sm.server_id AND s.creator_id = sm.user_id
         WHERE sm.server_id = ? AND sm.is_admin = 1",
    )
    .bind(server_id)
    .fetch_one(&mut *conn)
    .await?
    .get::<i64, _>("count");

    if count != 1 {
        tracing::error!("Server {} lost its creator admin membership", server_id);
        return Err(AppError::Internal(
            "server creator membership invariant violated".to_string(),
        ));
    }

    Ok(())
}

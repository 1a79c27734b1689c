//! Per-operation authorization.
//!
//! Every policy runs the same fixed pipeline and stops at the first
//! failure:
//!
//! 1. the root server (or user/message) exists,
//! 2. the caller is a member of that server,
//! 3. every child on the path belongs to its claimed parent,
//! 4. the caller holds the required role,
//! 5. ownership / self rules (creator, sender, creator protection).
//!
//! Membership is checked right after the root so a non-member gets
//! `Forbidden` whether or not the child they asked about exists, and it
//! always runs before any role or ownership rule.
//!
//! | Operation                                | Policy                 |
//! |------------------------------------------|------------------------|
//! | view server, channels, members, messages | [`view_server`] et al. |
//! | create channel, post channel message     | member, any role       |
//! | update/delete channel                    | [`manage_channel`]     |
//! | join server                              | [`join_server`]        |
//! | add member                               | [`add_member`]         |
//! | update/delete member                     | [`manage_member`]      |
//! | leave server                             | [`leave_server`]       |
//! | update/delete server                     | [`manage_server`]      |
//! | update/delete message                    | [`manage_message`]     |

use sqlx::SqliteConnection;

use crate::authz::{guards, membership};
use crate::models::channel::Channel;
use crate::models::message::Message;
use crate::models::server::Server;
use crate::models::server_member::ServerMember;
use crate::models::user::User;
use crate::utils::error::{AppError, AppResult, Conflict, Denial};

/// The caller may act inside `server` as `member`.
#[derive(Debug, Clone)]
pub struct ServerGrant {
    pub server: Server,
    pub member: ServerMember,
}

#[derive(Debug, Clone)]
pub struct ChannelGrant {
    pub server: Server,
    pub channel: Channel,
    pub member: ServerMember,
}

#[derive(Debug, Clone)]
pub struct MemberGrant {
    pub server: Server,
    pub actor: ServerMember,
    pub target: ServerMember,
}

#[derive(Debug, Clone)]
pub struct AddMemberGrant {
    pub server: Server,
    pub user: User,
}

async fn require_member(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server: &Server,
) -> AppResult<ServerMember> {
    membership::find_member(conn, actor_id, &server.id)
        .await?
        .ok_or(AppError::Forbidden(Denial::NotMember))
}

pub fn require_admin(member: &ServerMember) -> AppResult<()> {
    if member.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(Denial::NotAdmin))
    }
}

pub fn require_creator(actor_id: &str, server: &Server) -> AppResult<()> {
    if server.is_creator(actor_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(Denial::NotCreator))
    }
}

pub fn require_not_creator(target_user_id: &str, server: &Server) -> AppResult<()> {
    if server.is_creator(target_user_id) {
        Err(AppError::Forbidden(Denial::CreatorProtected))
    } else {
        Ok(())
    }
}

pub fn require_sender(actor_id: &str, message: &Message) -> AppResult<()> {
    if message.sender_id == actor_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(Denial::NotSender))
    }
}

/// View the server, its channel list and its member list; also create a
/// channel. Any member qualifies.
pub async fn view_server(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
) -> AppResult<ServerGrant> {
    let server = guards::find_server(conn, server_id).await?;
    let member = require_member(conn, actor_id, &server).await?;
    Ok(ServerGrant { server, member })
}

/// Update or delete the server itself. Ownership, not membership.
pub async fn manage_server(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
) -> AppResult<Server> {
    let server = guards::find_server(conn, server_id).await?;
    require_creator(actor_id, &server)?;
    Ok(server)
}

/// View one channel, its messages, or post into it.
pub async fn view_channel(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
) -> AppResult<ChannelGrant> {
    let ServerGrant { server, member } = view_server(conn, actor_id, server_id).await?;
    let channel = guards::verify_channel_belongs(conn, &server, channel_id).await?;
    Ok(ChannelGrant {
        server,
        channel,
        member,
    })
}

pub async fn manage_channel(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
) -> AppResult<ChannelGrant> {
    let grant = view_channel(conn, actor_id, server_id, channel_id).await?;
    require_admin(&grant.member)?;
    Ok(grant)
}

pub async fn view_member(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
    member_id: &str,
) -> AppResult<MemberGrant> {
    let ServerGrant { server, member } = view_server(conn, actor_id, server_id).await?;
    let target = guards::verify_member_belongs(conn, &server, member_id).await?;
    Ok(MemberGrant {
        server,
        actor: member,
        target,
    })
}

/// Update (promote/demote) or remove a member record. The creator's
/// record is never a valid target.
pub async fn manage_member(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
    member_id: &str,
) -> AppResult<MemberGrant> {
    let grant = view_member(conn, actor_id, server_id, member_id).await?;
    require_admin(&grant.actor)?;
    require_not_creator(&grant.target.user_id, &grant.server)?;
    Ok(grant)
}

/// The caller joins on their own behalf; being a member already is a
/// duplicate, not a failure of authority.
pub async fn join_server(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
) -> AppResult<Server> {
    let server = guards::find_server(conn, server_id).await?;
    if membership::is_member(conn, actor_id, &server.id).await? {
        return Err(AppError::Conflict(Conflict::AlreadyMember));
    }
    Ok(server)
}

pub async fn add_member(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
    target_user_id: &str,
) -> AppResult<AddMemberGrant> {
    let ServerGrant { server, member } = view_server(conn, actor_id, server_id).await?;
    let user = guards::find_user(conn, target_user_id).await?;
    require_admin(&member)?;
    if membership::is_member(conn, &user.id, &server.id).await? {
        return Err(AppError::Conflict(Conflict::AlreadyMember));
    }
    Ok(AddMemberGrant { server, user })
}

pub async fn leave_server(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
) -> AppResult<ServerGrant> {
    let grant = view_server(conn, actor_id, server_id).await?;
    require_not_creator(actor_id, &grant.server)?;
    Ok(grant)
}

/// View one message through its full server/channel path.
pub async fn view_channel_message(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
    message_id: &str,
) -> AppResult<(ChannelGrant, Message)> {
    let grant = view_channel(conn, actor_id, server_id, channel_id).await?;
    let message = guards::verify_message_belongs(conn, &grant.channel, message_id).await?;
    Ok((grant, message))
}

/// Update or delete a message addressed through its server/channel path.
/// Only the path and the sender matter; membership is not re-required.
pub async fn manage_channel_message(
    conn: &mut SqliteConnection,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
    message_id: &str,
) -> AppResult<Message> {
    let server = guards::find_server(conn, server_id).await?;
    let channel = guards::verify_channel_belongs(conn, &server, channel_id).await?;
    let message = guards::verify_message_belongs(conn, &channel, message_id).await?;
    require_sender(actor_id, &message)?;
    Ok(message)
}

/// Update or delete any message (channel or direct) by id.
pub async fn manage_message(
    conn: &mut SqliteConnection,
    actor_id: &str,
    message_id: &str,
) -> AppResult<Message> {
    let message = guards::find_message(conn, message_id).await?;
    require_sender(actor_id, &message)?;
    Ok(message)
}

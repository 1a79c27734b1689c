use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::authz::{guards, policy};
use crate::database::{self, DbPool};
use crate::models::message::{Message, MessageTarget, MessageWithSender};
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::{required, validate_message_content, validate_message_title};

const SELECT_WITH_SENDER: &str = "SELECT m.*, u.username AS sender_username FROM messages m
     JOIN users u ON u.id = m.sender_id";

/// Body for posting and for editing. A post needs `content`; an edit
/// needs at least one of the two fields.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MessageRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

async fn insert_message(conn: &mut SqliteConnection, message: &Message) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO messages (id, sender_id, channel_id, receiver_id, title, content, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&message.id)
    .bind(&message.sender_id)
    .bind(&message.channel_id)
    .bind(&message.receiver_id)
    .bind(&message.title)
    .bind(&message.content)
    .bind(&message.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Applies an edit in place. A title can only be set on channel messages.
async fn apply_update(
    conn: &mut SqliteConnection,
    mut message: Message,
    request: MessageRequest,
) -> AppResult<Message> {
    if request.content.is_none() && request.title.is_none() {
        return Err(AppError::Validation(
            "An edit must change the content or the title".to_string(),
        ));
    }
    if let Some(content) = request.content {
        validate_message_content(&content)?;
        message.content = content;
    }
    if let Some(title) = request.title {
        if message.is_direct() {
            return Err(AppError::Validation(
                "Direct messages cannot have a title".to_string(),
            ));
        }
        validate_message_title(&title)?;
        message.title = Some(title);
    }
    message.edited_at = Some(Utc::now().to_rfc3339());

    sqlx::query("UPDATE messages SET title = ?, content = ?, edited_at = ? WHERE id = ?")
        .bind(&message.title)
        .bind(&message.content)
        .bind(&message.edited_at)
        .bind(&message.id)
        .execute(&mut *conn)
        .await?;

    Ok(message)
}

async fn delete_message_row(conn: &mut SqliteConnection, message: &Message) -> AppResult<()> {
    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(&message.id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Newest first.
pub async fn list_channel_messages(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
) -> AppResult<Vec<MessageWithSender>> {
    let mut tx = database::begin_read(pool).await?;
    let grant = policy::view_channel(&mut tx, actor_id, server_id, channel_id).await?;

    let messages = sqlx::query_as::<_, MessageWithSender>(&format!(
        "{} WHERE m.channel_id = ? ORDER BY m.created_at DESC, m.rowid DESC",
        SELECT_WITH_SENDER
    ))
    .bind(&grant.channel.id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(messages)
}

pub async fn get_channel_message(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
    message_id: &str,
) -> AppResult<Message> {
    let mut tx = database::begin_read(pool).await?;
    let (_grant, message) =
        policy::view_channel_message(&mut tx, actor_id, server_id, channel_id, message_id).await?;
    tx.commit().await?;
    Ok(message)
}

pub async fn post_channel_message(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
    request: MessageRequest,
) -> AppResult<Message> {
    let content = required(request.content, "content")?;
    validate_message_content(&content)?;
    if let Some(title) = &request.title {
        validate_message_title(title)?;
    }

    let mut tx = database::begin(pool).await?;
    let grant = policy::view_channel(&mut tx, actor_id, server_id, channel_id).await?;
    let message = Message::new(
        actor_id.to_string(),
        MessageTarget::Channel(grant.channel.id.clone()),
        request.title,
        content,
    );
    insert_message(&mut tx, &message).await?;
    tx.commit().await?;

    tracing::debug!("Message {} posted to channel {}", message.id, grant.channel.id);
    Ok(message)
}

pub async fn update_channel_message(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
    message_id: &str,
    request: MessageRequest,
) -> AppResult<Message> {
    let mut tx = database::begin(pool).await?;
    let message =
        policy::manage_channel_message(&mut tx, actor_id, server_id, channel_id, message_id)
            .await?;
    let message = apply_update(&mut tx, message, request).await?;
    tx.commit().await?;
    Ok(message)
}

pub async fn delete_channel_message(
    pool: &DbPool,
    actor_id: &str,
    server_id: &str,
    channel_id: &str,
    message_id: &str,
) -> AppResult<Message> {
    let mut tx = database::begin(pool).await?;
    let message =
        policy::manage_channel_message(&mut tx, actor_id, server_id, channel_id, message_id)
            .await?;
    delete_message_row(&mut tx, &message).await?;
    tx.commit().await?;
    Ok(message)
}

pub async fn send_direct_message(
    pool: &DbPool,
    actor_id: &str,
    receiver_id: &str,
    request: MessageRequest,
) -> AppResult<Message> {
    let content = required(request.content, "content")?;
    validate_message_content(&content)?;
    if request.title.is_some() {
        return Err(AppError::Validation(
            "Direct messages cannot have a title".to_string(),
        ));
    }

    let mut tx = database::begin(pool).await?;
    let receiver = guards::find_user(&mut tx, receiver_id).await?;
    let message = Message::new(
        actor_id.to_string(),
        MessageTarget::Direct(receiver.id),
        None,
        content,
    );
    insert_message(&mut tx, &message).await?;
    tx.commit().await?;

    tracing::debug!("Direct message {} sent by {}", message.id, actor_id);
    Ok(message)
}

/// Direct messages addressed to the caller, newest first.
pub async fn list_received_messages(
    pool: &DbPool,
    actor_id: &str,
) -> AppResult<Vec<MessageWithSender>> {
    let messages = sqlx::query_as::<_, MessageWithSender>(&format!(
        "{} WHERE m.receiver_id = ? ORDER BY m.created_at DESC, m.rowid DESC",
        SELECT_WITH_SENDER
    ))
    .bind(actor_id)
    .fetch_all(pool.as_ref())
    .await?;

    Ok(messages)
}

pub async fn update_message(
    pool: &DbPool,
    actor_id: &str,
    message_id: &str,
    request: MessageRequest,
) -> AppResult<Message> {
    let mut tx = database::begin(pool).await?;
    let message = policy::manage_message(&mut tx, actor_id, message_id).await?;
    let message = apply_update(&mut tx, message, request).await?;
    tx.commit().await?;
    Ok(message)
}

pub async fn delete_message(pool: &DbPool, actor_id: &str, message_id: &str) -> AppResult<Message> {
    let mut tx = database::begin(pool).await?;
    let message = policy::manage_message(&mut tx, actor_id, message_id).await?;
    delete_message_row(&mut tx, &message).await?;
    tx.commit().await?;
    Ok(message)
}

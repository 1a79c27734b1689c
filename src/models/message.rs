use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A channel message has `channel_id` set; a direct message has
/// `receiver_id` set. Never both.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub channel_id: Option<String>,
    pub receiver_id: Option<String>,
    pub title: Option<String>,
    pub content: String,
    pub created_at: String,
    pub edited_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageWithSender {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub message: Message,
    pub sender_username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    Channel(String),
    Direct(String),
}

impl Message {
    pub fn new(
        sender_id: String,
        target: MessageTarget,
        title: Option<String>,
        content: String,
    ) -> Self {
        let (channel_id, receiver_id, title) = match target {
            MessageTarget::Channel(channel_id) => (Some(channel_id), None, title),
            MessageTarget::Direct(receiver_id) => (None, Some(receiver_id), None),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            sender_id,
            channel_id,
            receiver_id,
            title,
            content,
            created_at: Utc::now().to_rfc3339(),
            edited_at: None,
        }
    }

    pub fn is_direct(&self) -> bool {
        self.receiver_id.is_some()
    }
}

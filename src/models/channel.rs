use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    pub id: String,
    pub server_id: String,
    pub creator_id: String,
    pub name: String,
    pub created_at: String,
}

impl Channel {
    pub fn new(server_id: String, creator_id: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            server_id,
            creator_id,
            name,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

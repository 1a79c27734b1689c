use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub created_at: String,
}

impl Server {
    pub fn new(name: String, creator_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            creator_id,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator_id == user_id
    }
}

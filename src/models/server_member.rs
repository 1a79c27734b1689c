use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServerMember {
    pub id: String,
    pub server_id: String,
    pub user_id: String,
    pub is_admin: bool,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServerMemberWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub member: ServerMember,
    pub username: String,
}

impl ServerMember {
    pub fn new(server_id: String, user_id: String, role: ServerRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            server_id,
            user_id,
            is_admin: role.is_admin(),
            joined_at: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerRole {
    Member,
    Admin,
}

impl ServerRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, ServerRole::Admin)
    }
}

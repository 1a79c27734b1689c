use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
    Away,
}

impl Presence {
    pub fn as_str(&self) -> &str {
        match self {
            Presence::Online => "online",
            Presence::Offline => "offline",
            Presence::Away => "away",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(Presence::Online),
            "offline" => Some(Presence::Offline),
            "away" => Some(Presence::Away),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

impl User {
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        name: Option<String>,
        status: Presence,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            name,
            status: status.as_str().to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

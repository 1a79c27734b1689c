use serde::{Deserialize, Serialize};

use crate::authz::{cascade, guards};
use crate::database::{self, DbPool};
use crate::models::user::UserResponse;
use crate::services::auth::parse_presence;
use crate::utils::crypto::hash_password;
use crate::utils::error::AppResult;
use crate::utils::validation::{validate_email, validate_password, validate_username};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateAccountRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}

pub async fn get_account(pool: &DbPool, actor_id: &str) -> AppResult<UserResponse> {
    let mut tx = database::begin_read(pool).await?;
    let user = guards::find_user(&mut tx, actor_id).await?;
    tx.commit().await?;
    Ok(UserResponse::from(user))
}

/// Fields left out of the request keep their current value.
pub async fn update_account(
    pool: &DbPool,
    actor_id: &str,
    request: UpdateAccountRequest,
) -> AppResult<UserResponse> {
    if let Some(username) = &request.username {
        validate_username(username)?;
    }
    if let Some(email) = &request.email {
        validate_email(email)?;
    }
    let status = match request.status.as_deref() {
        Some(status) => Some(parse_presence(Some(status))?),
        None => None,
    };
    let password_hash = match request.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let mut tx = database::begin(pool).await?;
    let mut user = guards::find_user(&mut tx, actor_id).await?;

    if let Some(username) = request.username {
        user.username = username;
    }
    if let Some(email) = request.email {
        user.email = email;
    }
    if let Some(name) = request.name {
        user.name = Some(name);
    }
    if let Some(status) = status {
        user.status = status.as_str().to_string();
    }
    if let Some(password_hash) = password_hash {
        user.password_hash = password_hash;
    }

    sqlx::query(
        "UPDATE users SET username = ?, email = ?, name = ?, status = ?, password_hash = ?
         WHERE id = ?",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.status)
    .bind(&user.password_hash)
    .bind(&user.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(UserResponse::from(user))
}

/// Removes the account and everything it owns: servers it created (with
/// their members, channels and messages), its memberships, channels it
/// created, and every message it sent or received.
pub async fn delete_account(pool: &DbPool, actor_id: &str) -> AppResult<UserResponse> {
    let mut tx = database::begin(pool).await?;
    let user = guards::find_user(&mut tx, actor_id).await?;
    cascade::delete_cascading(&mut tx, cascade::Table::Users, &user.id).await?;
    tx.commit().await?;

    tracing::info!("Deleted user {} ({})", user.username, user.id);
    Ok(UserResponse::from(user))
}

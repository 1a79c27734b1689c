use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::database::{self, DbPool};
use crate::models::user::{Presence, User, UserResponse};
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::error::{AppError, AppResult};
use crate::utils::jwt::JwtService;
use crate::utils::validation::{
    required, validate_email, validate_password, validate_username,
};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

pub fn parse_presence(status: Option<&str>) -> AppResult<Presence> {
    match status {
        None => Ok(Presence::Offline),
        Some(status) => Presence::parse(status).ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid status '{}': expected online, offline or away",
                status
            ))
        }),
    }
}

pub async fn insert_user(conn: &mut SqliteConnection, user: &User) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, name, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.name)
    .bind(&user.status)
    .bind(&user.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Username and email uniqueness is left to the store; a collision comes
/// back as `Conflict::FieldInUse` naming the column.
pub async fn register_user(pool: &DbPool, request: RegisterRequest) -> AppResult<UserResponse> {
    let username = required(request.username, "username")?;
    let email = required(request.email, "email")?;
    let password = required(request.password, "password")?;

    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&password)?;
    let status = parse_presence(request.status.as_deref())?;

    let password_hash = hash_password(&password)?;
    let user = User::new(username, email, password_hash, request.name, status);

    let mut tx = database::begin(pool).await?;
    insert_user(&mut tx, &user).await?;
    tx.commit().await?;

    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok(UserResponse::from(user))
}

pub async fn login_user(
    pool: &DbPool,
    request: LoginRequest,
    jwt_service: &JwtService,
) -> AppResult<LoginResponse> {
    let email = required(request.email, "email")?;
    let password = required(request.password, "password")?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool.as_ref())
        .await?;

    let user = match user {
        Some(user) if verify_password(&password, &user.password_hash)? => user,
        _ => {
            tracing::debug!("Failed login for {}", email);
            return Err(AppError::Unauthenticated(
                "invalid login details".to_string(),
            ));
        }
    };

    let token = jwt_service.generate_token(&user.id)?;

    Ok(LoginResponse {
        message: format!("welcome back {}", user.username),
        user: UserResponse::from(user),
        token,
    })
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(Denial),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(Conflict),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Why an authenticated caller was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    #[error("user is not a member of this server")]
    NotMember,

    #[error("server admin privileges required")]
    NotAdmin,

    #[error("only the server creator can perform this action")]
    NotCreator,

    #[error("only the original sender can modify this message")]
    NotSender,

    #[error("the server creator cannot be removed or demoted")]
    CreatorProtected,
}

impl Denial {
    pub fn code(&self) -> &'static str {
        match self {
            Denial::NotMember => "not_member",
            Denial::NotAdmin => "not_admin",
            Denial::NotCreator => "not_creator",
            Denial::NotSender => "not_sender",
            Denial::CreatorProtected => "creator_protected",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    #[error("user is already a member of this server")]
    AlreadyMember,

    #[error("{0} already in use")]
    FieldInUse(String),

    #[error("{0} is required")]
    FieldRequired(String),
}

impl Conflict {
    pub fn code(&self) -> &'static str {
        match self {
            Conflict::AlreadyMember => "duplicate_member",
            Conflict::FieldInUse(_) => "field_in_use",
            Conflict::FieldRequired(_) => "field_required",
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub reason: String,
    pub message: String,
}

impl AppError {
    /// Machine-readable reason, finer grained than the status code.
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Forbidden(denial) => denial.code(),
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(conflict) => conflict.code(),
            AppError::Validation(_) => "validation_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let reason = self.reason().to_string();
        let (status, error_type, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Unauthenticated(ref msg) => {
                tracing::debug!("Unauthenticated: {}", msg);
                (StatusCode::UNAUTHORIZED, "unauthenticated", msg.clone())
            }
            AppError::Forbidden(denial) => {
                tracing::debug!("Forbidden: {}", denial);
                (StatusCode::FORBIDDEN, "forbidden", denial.to_string())
            }
            AppError::NotFound(ref msg) => {
                tracing::debug!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, "not_found", msg.clone())
            }
            AppError::Conflict(ref conflict) => {
                tracing::debug!("Conflict: {}", conflict);
                (StatusCode::CONFLICT, "conflict", conflict.to_string())
            }
            AppError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    msg.clone(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            reason,
            message,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    return AppError::Conflict(unique_conflict(db_err.message()));
                }
                ErrorKind::NotNullViolation => {
                    let columns = constraint_columns(db_err.message());
                    return AppError::Conflict(Conflict::FieldRequired(columns.join(", ")));
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Column names out of a SQLite constraint message such as
/// `UNIQUE constraint failed: users.email`.
fn constraint_columns(message: &str) -> Vec<String> {
    let detail = message
        .split_once(": ")
        .map(|(_, detail)| detail)
        .unwrap_or(message);

    detail
        .split(',')
        .map(|column| {
            let column = column.trim();
            column
                .rsplit_once('.')
                .map(|(_, name)| name)
                .unwrap_or(column)
                .to_string()
        })
        .collect()
}

fn unique_conflict(message: &str) -> Conflict {
    let columns = constraint_columns(message);
    let has = |name: &str| columns.iter().any(|c| c == name);

    if message.contains("server_members") && has("server_id") && has("user_id") {
        Conflict::AlreadyMember
    } else {
        Conflict::FieldInUse(columns.join(", "))
    }
}

pub type AppResult<T> = Result<T, AppError>;

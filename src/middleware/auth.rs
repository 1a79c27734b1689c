use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use sqlx::Row;
use std::sync::Arc;

use crate::api::AppState;
use crate::database::DbPool;
use crate::utils::error::{AppError, AppResult};
use crate::utils::jwt::JwtService;

/// The acting user, resolved from the session token. Handlers take the
/// caller's identity from here and nowhere else.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("No session for this request".to_string()))
    }
}

/// Verifies the token and that its user still exists.
pub async fn resolve_identity(pool: &DbPool, jwt: &JwtService, token: &str) -> AppResult<String> {
    let user_id = jwt.extract_user_id(token)?;

    let user_exists = sqlx::query("SELECT COUNT(*) as count FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_one(pool.as_ref())
        .await?
        .get::<i64, _>("count");

    if user_exists == 0 {
        return Err(AppError::Unauthenticated(
            "User no longer exists".to_string(),
        ));
    }

    Ok(user_id)
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(|| {
        AppError::Unauthenticated("Missing or invalid authorization header".to_string())
    })?;

    let user_id = resolve_identity(&state.db, &state.jwt_service, bearer.token()).await?;

    request.extensions_mut().insert(AuthUser { id: user_id });

    Ok(next.run(request).await)
}

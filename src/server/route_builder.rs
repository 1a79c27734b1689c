use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::AppState;
use crate::config::Config;
use crate::database;
use crate::utils::jwt::JwtService;

pub fn build_router(state: Arc<AppState>) -> Router {
    crate::api::routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn register_routes(config: &Config) -> anyhow::Result<Router> {
    let db = database::create_pool(&config.database_url, config.db_max_connections).await?;

    tracing::info!("Database connected and migrations applied");

    let jwt_service = Arc::new(JwtService::new(
        &config.secret_key,
        chrono::Duration::hours(config.token_ttl_hours),
    ));

    let state = Arc::new(AppState { db, jwt_service });

    Ok(build_router(state))
}

pub mod auth;
pub mod channels;
pub mod members;
pub mod messages;
pub mod servers;
pub mod users;

use axum::Router;
use std::sync::Arc;

pub use auth::AppState;

pub fn routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .nest("/server", servers::routes(state.clone()))
        .nest("/user", users::router().with_state(state.clone()))
        .nest("/message", messages::router().with_state(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(auth::health().with_state(state.clone()))
        .nest("/auth", auth::routes(state))
        .merge(protected_routes)
}

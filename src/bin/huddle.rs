use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use huddle::config::Config;
use huddle::server::route_builder::register_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,huddle=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let app = register_routes(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

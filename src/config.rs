use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub secret_key: String,
    pub token_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://huddle.db?mode=rwc".to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DB_MAX_CONNECTIONS")?,
            secret_key: std::env::var("SECRET_KEY").context("SECRET_KEY not set")?,
            // Session tokens live for one day unless overridden.
            token_ttl_hours: std::env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("Invalid TOKEN_TTL_HOURS")?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
